use strata_core::{archive::ArchiveHandle, config};

mod backup;
pub mod cancellation;
mod restore;
pub(crate) mod runner;

/// Execution id, allocated by the tracker in increasing order starting at 1.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub struct Id(pub u64);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum JobKind {
    Backup,
    Restore,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Backup => f.write_str("BACKUP"),
            JobKind::Restore => f.write_str("RESTORE"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Status {
    Starting,
    Started,
    Stopping,
    Stopped,
    Completed,
    Failed,
    Abandoned,
}

impl Status {
    pub fn is_running(&self) -> bool {
        matches!(self, Status::Starting | Status::Started | Status::Stopping)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Starting => "STARTING",
            Status::Started => "STARTED",
            Status::Stopping => "STOPPING",
            Status::Stopped => "STOPPED",
            Status::Completed => "COMPLETED",
            Status::Failed => "FAILED",
            Status::Abandoned => "ABANDONED",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid job option '{0}'")]
pub struct InvalidOption(pub String);

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Parameters {
    pub dry_run: bool,
    pub best_effort: bool,
    /// number of accepted entities handed to the writer at once
    pub chunk_size: usize,
    /// every option as given, including the ones recognized above
    pub options: Vec<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            dry_run: false,
            best_effort: false,
            chunk_size: 1,
            options: vec![],
        }
    }
}

fn parse_flag(option: &str, value: Option<&str>) -> Result<bool, InvalidOption> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("true") | Some("yes") | Some("1") => Ok(true),
        Some("false") | Some("no") | Some("0") => Ok(false),
        Some(_) => Err(InvalidOption(option.to_owned())),
    }
}

impl Parameters {
    /// Builds job parameters from the configured defaults and `KEY[=VALUE]` options. Keys are
    /// case-insensitive and may use underscores and a `BK_` prefix, so `BK_DRY_RUN` is the same as
    /// `dry-run`. Unrecognized options are kept in [`Parameters::options`] only.
    pub fn from_options<I, S>(defaults: &config::Jobs, options: I) -> Result<Self, InvalidOption>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut params = Parameters {
            dry_run: defaults.dry_run,
            best_effort: defaults.best_effort,
            chunk_size: defaults.chunk_size.max(1),
            options: vec![],
        };

        for option in options {
            let option = option.into();
            let (key, value) = match option.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (option.as_str(), None),
            };
            let key = key.trim().to_lowercase().replace('_', "-");
            let key = key.strip_prefix("bk-").unwrap_or(&key);

            match key {
                "dry-run" => params.dry_run = parse_flag(&option, value)?,
                "best-effort" => params.best_effort = parse_flag(&option, value)?,
                "chunk-size" => {
                    params.chunk_size = value
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .filter(|size| *size > 0)
                        .ok_or_else(|| InvalidOption(option.clone()))?
                }
                _ => {}
            }
            params.options.push(option);
        }
        Ok(params)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Spec {
    Backup(BackupSpec),
    Restore(RestoreSpec),
}

impl From<BackupSpec> for Spec {
    fn from(spec: BackupSpec) -> Self {
        Spec::Backup(spec)
    }
}

impl From<RestoreSpec> for Spec {
    fn from(spec: RestoreSpec) -> Self {
        Spec::Restore(spec)
    }
}

impl Spec {
    pub fn kind(&self) -> JobKind {
        match self {
            Spec::Backup(_) => JobKind::Backup,
            Spec::Restore(_) => JobKind::Restore,
        }
    }

    pub fn archive(&self) -> &ArchiveHandle {
        match self {
            Spec::Backup(spec) => &spec.archive,
            Spec::Restore(spec) => &spec.archive,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Spec::Backup(spec) => format!("backup.{}", spec.archive),
            Spec::Restore(spec) => format!("restore.{}", spec.archive),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BackupSpec {
    /// the output archive
    pub archive: ArchiveHandle,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RestoreSpec {
    /// the input archive
    pub archive: ArchiveHandle,
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum FailureKind {
    /// an entity failed referential or uniqueness checks
    Validation,
    /// archive or catalog backend I/O
    Io,
    /// replacing the live catalog failed
    SwapIn,
    /// the job itself broke down
    Internal,
}

/// A failure or warning recorded on an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    /// label of the entity the failure is about, if any
    pub entity: Option<String>,
    pub message: String,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.entity {
            Some(entity) => write!(f, "{}: {}", entity, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Failure {}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Failure {
            kind,
            entity: None,
            message: message.into(),
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Uses the whole source chain of `error` as the message.
    pub fn from_error(kind: FailureKind, error: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Failure::new(kind, message)
    }
}
