use clap::Parser as _;
use std::path::PathBuf;
use strata_core::config::{AppConfig, ConfigLoadError};

pub mod cli;
mod commands;

fn setup_logger(verbose: bool) -> eyre::Result<()> {
    use tracing::Level;
    use tracing_subscriber::{
        filter::LevelFilter, fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, Registry,
    };

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    Registry::default()
        .with(LevelFilter::from(level))
        .with(
            layer()
                .with_ansi(true)
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}

/// Loads the given configuration file, or the default one if it exists.
async fn load_config(config_file: Option<PathBuf>) -> eyre::Result<AppConfig> {
    let explicit = config_file.is_some();
    let config_file = cli::ConfigFile::from(config_file);
    let path = match config_file.path() {
        Ok(path) => path,
        Err(_) if !explicit => return Ok(AppConfig::default()),
        Err(error) => return Err(error),
    };

    match AppConfig::parse_file(path).await {
        Err(ConfigLoadError::IoError(_, error))
            if !explicit && error.kind() == std::io::ErrorKind::NotFound =>
        {
            tracing::debug!(path = %config_file, "no configuration file, using defaults");
            Ok(AppConfig::default())
        }
        result => Ok(result?),
    }
}

/// Parses the command line and runs the selected command.
pub async fn run() -> eyre::Result<()> {
    let args = cli::Cli::parse();
    setup_logger(args.verbose)?;

    let mut config = load_config(args.config_file).await?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = Some(data_dir);
    }

    match args.subcommand {
        cli::Cmd::Backup(args) => commands::backup(&config, args).await,
        cli::Cmd::Restore(args) => commands::restore(&config, args).await,
        cli::Cmd::Config => commands::config(&config),
        cli::Cmd::Version => commands::version(),
    }
}
