use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    /// directory holding the live catalog
    #[serde(alias = "data_dir")]
    pub data_dir: Option<PathBuf>,
    /// directory for per-job working directories
    #[serde(alias = "work_dir")]
    pub work_dir: Option<PathBuf>,
    /// directory uploaded restore archives are stored in
    #[serde(alias = "upload_dir")]
    pub upload_dir: Option<PathBuf>,
    pub jobs: Jobs,

    /// path of the configuration file, if the configuration was loaded from a file
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Defaults for job parameters; options given with a job override these.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct Jobs {
    #[serde(alias = "best_effort")]
    pub best_effort: bool,
    #[serde(alias = "dry_run")]
    pub dry_run: bool,
    #[serde(alias = "chunk_size")]
    pub chunk_size: usize,
}

impl Default for Jobs {
    fn default() -> Self {
        Jobs {
            best_effort: false,
            dry_run: false,
            chunk_size: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("invalid configuration string")]
    InvalidConfigString(String, #[source] eyre::Report),
    #[error("invalid configuration file {}", .0.display())]
    InvalidConfigFile(PathBuf, #[source] eyre::Report),
    #[error("i/o error reading configuration file {}", .0.display())]
    IoError(PathBuf, std::io::Error),
}

impl AppConfig {
    pub fn parse(s: &str) -> Result<AppConfig, ConfigLoadError> {
        toml::from_str(s).map_err(|e| ConfigLoadError::InvalidConfigString(s.to_owned(), e.into()))
    }

    pub async fn parse_file(p: &Path) -> Result<AppConfig, ConfigLoadError> {
        let config_string = tokio::fs::read_to_string(p)
            .await
            .map_err(|e| ConfigLoadError::IoError(p.to_owned(), e))?;
        let mut config: AppConfig = toml::from_str(&config_string)
            .map_err(|e| ConfigLoadError::InvalidConfigFile(p.to_owned(), e.into()))?;
        config.source = Some(p.to_owned());
        Ok(config)
    }
}
