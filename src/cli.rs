use dirs_next as dirs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigFile(Option<PathBuf>);

impl ConfigFile {
    pub fn path(&self) -> eyre::Result<&Path> {
        self.0
            .as_ref()
            .map(|p| p.as_path())
            .ok_or_else(|| eyre::eyre!("failed to get default config file path"))
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let default_path = dirs::config_dir().map(|dir| dir.join("strata").join("strata.toml"));
        ConfigFile(default_path)
    }
}

impl From<Option<PathBuf>> for ConfigFile {
    /// Falls back to the default path when no path is given.
    fn from(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => ConfigFile(Some(path)),
            None => Default::default(),
        }
    }
}

impl std::fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(path) => write!(f, "{}", path.display()),
            None => write!(f, "<none>"),
        }
    }
}

/// Backs up and restores a geospatial configuration catalog.
#[derive(clap::Parser)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Sets a custom configuration file path
    #[arg(short, long, env = "STRATA_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Sets the data directory holding the live catalog, overriding the configuration
    #[arg(long, env = "STRATA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Logs debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub subcommand: Cmd,
}

#[derive(clap::Subcommand)]
pub enum Cmd {
    /// Backs up the catalog into an archive
    Backup(backup::Cli),

    /// Restores the catalog from an archive
    Restore(restore::Cli),

    /// Prints the active configuration
    Config,

    /// Prints version information
    Version,
}

/// Options shared by backups and restores.
#[derive(clap::Args)]
pub struct JobOptions {
    /// Validates and counts everything but writes nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Skips invalid entities with a warning instead of failing
    #[arg(long)]
    pub best_effort: bool,

    /// Passes a KEY[=VALUE] option to the job
    #[arg(long = "option", value_name = "KEY[=VALUE]")]
    pub options: Vec<String>,
}

impl JobOptions {
    /// All options in the job option vocabulary; the flags come last so they win.
    pub fn to_options(&self) -> Vec<String> {
        let mut options = self.options.clone();
        if self.dry_run {
            options.push("dry-run".to_owned());
        }
        if self.best_effort {
            options.push("best-effort".to_owned());
        }
        options
    }
}

pub mod backup {
    use std::path::PathBuf;

    #[derive(clap::Args)]
    pub struct Cli {
        /// The archive to write; its extension selects the format
        #[arg(short, long, value_name = "ARCHIVE")]
        pub output: PathBuf,

        /// Replaces an existing archive
        #[arg(long)]
        pub overwrite: bool,

        #[command(flatten)]
        pub job: super::JobOptions,
    }
}

pub mod restore {
    use std::path::PathBuf;

    #[derive(clap::Args)]
    pub struct Cli {
        /// The archive to restore from
        #[arg(short, long, value_name = "ARCHIVE")]
        pub input: PathBuf,

        #[command(flatten)]
        pub job: super::JobOptions,
    }
}
