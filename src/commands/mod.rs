use strata_core::config::AppConfig;

mod jobs;
mod report;

pub use jobs::{backup, restore};

pub fn config(config: &AppConfig) -> eyre::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

pub fn version() -> eyre::Result<()> {
    match strata_core::VERSION {
        Some(version) => println!("strata: {}", version),
        None => println!("strata: [untagged build]"),
    }
    Ok(())
}
