//! Admission and bookkeeping of backup and restore executions. At most one of them runs at a time.

use crate::{
    execution::Execution,
    job::{
        cancellation::{self, Reason},
        runner::{self, Context},
        BackupSpec, Failure, FailureKind, Id, JobKind, Parameters, RestoreSpec, Spec, Status,
    },
    Settings,
};
use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use strata_core::{
    archive::{self, ArchiveHandle},
    catalog::LiveCatalog,
    lock::ConfigLock,
};
use tokio::io::{AsyncRead, AsyncWriteExt};

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("a {kind} job is already running as execution {id}")]
    AlreadyRunning { id: Id, kind: JobKind },
    #[error("archive {} already exists", .0.display())]
    ArchiveExists(PathBuf),
    #[error("archive {} does not exist", .0.display())]
    MissingArchive(PathBuf),
    #[error("{} archives cannot hold a catalog: {}", .0.scheme(), .0.path().display())]
    SingleFileArchive(ArchiveHandle),
    #[error(transparent)]
    Archive(#[from] archive::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("no execution with id {0}")]
pub struct UnknownExecution(pub Id);

#[derive(Debug, thiserror::Error)]
pub enum StopError {
    #[error(transparent)]
    Unknown(#[from] UnknownExecution),
    #[error("execution {id} is not running, it is {status}")]
    NotRunning { id: Id, status: Status },
    #[error("execution {0} is already stopping")]
    AlreadyStopping(Id),
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveUnavailable {
    #[error(transparent)]
    Unknown(#[from] UnknownExecution),
    #[error("execution {0} is not a backup")]
    NotABackup(Id),
    #[error("backup {id} has not completed, it is {status}")]
    NotCompleted { id: Id, status: Status },
    #[error("backup {0} was a dry run and wrote no archive")]
    DryRun(Id),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid upload file name '{0}'")]
    InvalidFileName(String),
    #[error(transparent)]
    Archive(#[from] archive::Error),
    #[error("could not store upload at {}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

#[derive(Debug)]
struct RunningJob {
    execution: Arc<Execution>,
    cancellation: Option<cancellation::Send>,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    executions: BTreeMap<Id, Arc<Execution>>,
    running: Option<RunningJob>,
}

impl Registry {
    /// Allocates the next id and makes the new execution the running one.
    fn register(
        &mut self,
        spec: Spec,
        parameters: Parameters,
        restarted_from: Option<Id>,
    ) -> (Arc<Execution>, cancellation::Recv) {
        self.next_id += 1;
        let id = Id(self.next_id);
        let execution = Arc::new(Execution::new(id, spec, parameters, restarted_from));
        let (send, recv) = cancellation::new();
        self.executions.insert(id, execution.clone());
        self.running = Some(RunningJob {
            execution: execution.clone(),
            cancellation: Some(send),
        });
        (execution, recv)
    }

    fn release(&mut self, id: Id) {
        if let Some(running) = &self.running {
            if running.execution.id() == id {
                self.running = None;
            }
        }
    }
}

/// Entry point for submitting and inspecting jobs. Cheap to clone; clones share the registry.
///
/// Submitting jobs spawns tasks, so it must happen inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct Tracker {
    context: Arc<Context>,
    registry: Arc<Mutex<Registry>>,
}

impl Tracker {
    pub fn new(live: Arc<LiveCatalog>, lock: ConfigLock, settings: Settings) -> Self {
        Tracker {
            context: Arc::new(Context {
                live,
                lock,
                settings,
            }),
            registry: Default::default(),
        }
    }

    pub fn live(&self) -> &Arc<LiveCatalog> {
        &self.context.live
    }

    pub fn settings(&self) -> &Settings {
        &self.context.settings
    }

    /// Starts a backup of the live catalog into `output` and returns without waiting for it.
    pub fn run_backup_async(
        &self,
        output: impl Into<PathBuf>,
        overwrite: bool,
        parameters: Parameters,
    ) -> Result<Arc<Execution>, AdmissionError> {
        let archive = ArchiveHandle::resolve(output)?;
        if archive.scheme().is_single_file() {
            return Err(AdmissionError::SingleFileArchive(archive));
        }
        if !overwrite && archive.exists() {
            return Err(AdmissionError::ArchiveExists(archive.path().to_owned()));
        }
        self.admit(BackupSpec { archive }.into(), parameters)
    }

    /// Starts a restore from `input` and returns without waiting for it.
    pub fn run_restore_async(
        &self,
        input: impl Into<PathBuf>,
        parameters: Parameters,
    ) -> Result<Arc<Execution>, AdmissionError> {
        let input = input.into();
        if !input.exists() {
            return Err(AdmissionError::MissingArchive(input));
        }
        let archive = ArchiveHandle::resolve(input)?;
        if archive.scheme().is_single_file() {
            return Err(AdmissionError::SingleFileArchive(archive));
        }
        self.admit(RestoreSpec { archive }.into(), parameters)
    }

    fn admit(&self, spec: Spec, parameters: Parameters) -> Result<Arc<Execution>, AdmissionError> {
        let (execution, recv) = {
            let mut registry = self.registry.lock();
            if let Some(running) = &registry.running {
                return Err(AdmissionError::AlreadyRunning {
                    id: running.execution.id(),
                    kind: running.execution.kind(),
                });
            }
            registry.register(spec, parameters, None)
        };
        tracing::info!(id = %execution.id(), job = %execution.spec().label(), "admitted job");
        self.launch(execution.clone(), recv);
        Ok(execution)
    }

    fn launch(&self, execution: Arc<Execution>, recv: cancellation::Recv) {
        let tracker = self.clone();
        tokio::spawn(async move { tracker.supervise(execution, recv).await });
    }

    /// Runs the job in its own task and, once it ends, either restarts it or frees the running
    /// slot. A restart keeps the slot occupied throughout.
    async fn supervise(self, mut execution: Arc<Execution>, mut recv: cancellation::Recv) {
        loop {
            let handle = tokio::spawn(runner::run(
                self.context.clone(),
                execution.clone(),
                recv,
            ));
            let request = match handle.await {
                Ok(request) => request,
                Err(error) => {
                    tracing::error!(id = %execution.id(), %error, "job task ended abnormally");
                    execution.add_failure_exceptions([Failure::new(
                        FailureKind::Internal,
                        "job task panicked",
                    )]);
                    execution.set_status(Status::Abandoned);
                    self.registry.lock().release(execution.id());
                    return;
                }
            };

            match request {
                Some(request) if request.reason == Reason::Restart => {
                    let (restarted, restarted_recv) = self.registry.lock().register(
                        execution.spec().clone(),
                        execution.parameters().clone(),
                        Some(execution.id()),
                    );
                    tracing::info!(id = %execution.id(), restarted = %restarted.id(), "restarting job");
                    request.acknowledge();
                    execution = restarted;
                    recv = restarted_recv;
                }
                request => {
                    self.registry.lock().release(execution.id());
                    if let Some(request) = request {
                        request.acknowledge();
                    }
                    return;
                }
            }
        }
    }

    pub fn execution(&self, id: Id) -> Result<Arc<Execution>, UnknownExecution> {
        self.registry
            .lock()
            .executions
            .get(&id)
            .cloned()
            .ok_or(UnknownExecution(id))
    }

    pub fn status(&self, id: Id) -> Result<Status, UnknownExecution> {
        self.execution(id).map(|execution| execution.status())
    }

    /// All executions in id order.
    pub fn executions(&self) -> Vec<Arc<Execution>> {
        self.registry.lock().executions.values().cloned().collect()
    }

    pub fn running(&self) -> Option<Arc<Execution>> {
        self.registry
            .lock()
            .running
            .as_ref()
            .map(|running| running.execution.clone())
    }

    /// Asks a running execution to stop and waits until it has. Entities are never abandoned
    /// halfway; the job stops before the next one.
    pub async fn stop(&self, id: Id) -> Result<(), StopError> {
        self.cancel(id, Reason::Stop).await
    }

    /// Stops a running execution and runs its job again as a new execution, which is returned.
    /// `None` means the job finished before it saw the request.
    pub async fn restart(&self, id: Id) -> Result<Option<Arc<Execution>>, StopError> {
        self.cancel(id, Reason::Restart).await?;
        Ok(self
            .registry
            .lock()
            .executions
            .values()
            .find(|execution| execution.restarted_from() == Some(id))
            .cloned())
    }

    async fn cancel(&self, id: Id, reason: Reason) -> Result<(), StopError> {
        let send = {
            let mut registry = self.registry.lock();
            let execution = registry
                .executions
                .get(&id)
                .cloned()
                .ok_or(UnknownExecution(id))?;
            let status = execution.status();
            let running = match &mut registry.running {
                Some(running) if running.execution.id() == id && status.is_running() => running,
                _ => return Err(StopError::NotRunning { id, status }),
            };
            let send = running
                .cancellation
                .take()
                .ok_or(StopError::AlreadyStopping(id))?;
            execution.set_status(Status::Stopping);
            send
        };
        tracing::info!(%id, ?reason, "stopping job");
        send.cancel(reason).await;
        Ok(())
    }

    /// The archive written by a completed backup.
    pub fn backup_archive(&self, id: Id) -> Result<ArchiveHandle, ArchiveUnavailable> {
        let execution = self.execution(id)?;
        let spec = match execution.spec() {
            Spec::Backup(spec) => spec,
            Spec::Restore(_) => return Err(ArchiveUnavailable::NotABackup(id)),
        };
        match execution.status() {
            Status::Completed if execution.parameters().dry_run => {
                Err(ArchiveUnavailable::DryRun(id))
            }
            Status::Completed => Ok(spec.archive.clone()),
            status => Err(ArchiveUnavailable::NotCompleted { id, status }),
        }
    }

    /// Stores an uploaded archive in the upload directory under a unique name derived from
    /// `file_name`, ready to be passed to [`Tracker::run_restore_async`].
    pub async fn receive_upload<R>(
        &self,
        mut reader: R,
        file_name: &str,
    ) -> Result<ArchiveHandle, UploadError>
    where
        R: AsyncRead + Unpin,
    {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| UploadError::InvalidFileName(file_name.to_owned()))?;
        let dir = &self.context.settings.upload_dir;
        let path = dir.join(format!("{}-{}", uuid::Uuid::new_v4(), name));
        let archive = ArchiveHandle::resolve(&path)?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| UploadError::Io(dir.clone(), e))?;
        let io_error = |e| UploadError::Io(path.clone(), e);
        let mut file = tokio::fs::File::create(&path).await.map_err(io_error)?;
        let copied = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(copied) => copied,
            Err(error) => {
                drop(file);
                if let Err(error) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(%error, path = %path.display(), "could not remove partial upload");
                }
                return Err(io_error(error));
            }
        };
        file.flush().await.map_err(io_error)?;
        tracing::info!(path = %path.display(), bytes = copied, "received upload");
        Ok(archive)
    }
}
