use std::path::PathBuf;
use strata_core::config::AppConfig;

pub mod execution;
pub mod job;
pub mod pipeline;
pub mod tracker;

pub use execution::Execution;
pub use job::{Failure, FailureKind, Id, JobKind, Parameters, Status};
pub use tracker::Tracker;

/// Directories the jobs work in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// parent of the per-job working directories
    pub work_dir: PathBuf,
    /// where uploaded restore archives are stored
    pub upload_dir: PathBuf,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        let work_dir = config
            .work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("strata"));
        let upload_dir = config
            .upload_dir
            .clone()
            .unwrap_or_else(|| work_dir.join("uploads"));
        Settings {
            work_dir,
            upload_dir,
        }
    }
}
