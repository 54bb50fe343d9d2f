use crate::job::{Failure, Id, JobKind, Parameters, Spec, Status};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use strata_core::{archive::ArchiveHandle, model::Kind};
use time::OffsetDateTime;
use tokio::sync::watch;

#[derive(Debug)]
struct State {
    status: Status,
    started: OffsetDateTime,
    ended: Option<OffsetDateTime>,
    total_steps: usize,
    executed_steps: usize,
    failures: Vec<Failure>,
    warnings: Vec<Failure>,
    staged: BTreeMap<Kind, usize>,
}

/// One run of a backup or restore job. Shared between the tracker's registry and the running job;
/// frozen once its status is terminal.
#[derive(Debug)]
pub struct Execution {
    id: Id,
    spec: Spec,
    parameters: Parameters,
    restarted_from: Option<Id>,
    state: Mutex<State>,
    status_send: watch::Sender<Status>,
}

impl Execution {
    pub(crate) fn new(
        id: Id,
        spec: Spec,
        parameters: Parameters,
        restarted_from: Option<Id>,
    ) -> Self {
        let (status_send, _) = watch::channel(Status::Starting);
        Execution {
            id,
            spec,
            parameters,
            restarted_from,
            state: Mutex::new(State {
                status: Status::Starting,
                started: OffsetDateTime::now_utc(),
                ended: None,
                total_steps: 0,
                executed_steps: 0,
                failures: vec![],
                warnings: vec![],
                staged: BTreeMap::new(),
            }),
            status_send,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.spec.kind()
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// The output archive of a backup or the input archive of a restore.
    pub fn archive(&self) -> &ArchiveHandle {
        self.spec.archive()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The stopped execution this one was restarted from.
    pub fn restarted_from(&self) -> Option<Id> {
        self.restarted_from
    }

    pub fn status(&self) -> Status {
        self.state.lock().status
    }

    pub fn started(&self) -> OffsetDateTime {
        self.state.lock().started
    }

    pub fn ended(&self) -> Option<OffsetDateTime> {
        self.state.lock().ended
    }

    pub fn total_steps(&self) -> usize {
        self.state.lock().total_steps
    }

    pub fn executed_steps(&self) -> usize {
        self.state.lock().executed_steps
    }

    pub fn failures(&self) -> Vec<Failure> {
        self.state.lock().failures.clone()
    }

    pub fn warnings(&self) -> Vec<Failure> {
        self.state.lock().warnings.clone()
    }

    /// Number of entities of each kind in the staging catalog when the item stage of a restore
    /// ended.
    pub fn staged(&self) -> BTreeMap<Kind, usize> {
        self.state.lock().staged.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status_send.subscribe()
    }

    /// Waits until the execution reaches a terminal status.
    pub async fn wait_terminal(&self) -> Status {
        let mut recv = self.subscribe();
        loop {
            let status = *recv.borrow_and_update();
            if status.is_terminal() {
                return status;
            }
            if recv.changed().await.is_err() {
                return self.status();
            }
        }
    }

    pub fn add_failure_exceptions(&self, failures: impl IntoIterator<Item = Failure>) {
        let mut state = self.state.lock();
        if state.status.is_running() {
            state.failures.extend(failures);
        }
    }

    pub fn add_warning_exceptions(&self, warnings: impl IntoIterator<Item = Failure>) {
        let mut state = self.state.lock();
        if state.status.is_running() {
            state.warnings.extend(warnings);
        }
    }

    /// Moves to `status` unless the execution is already terminal. Returns whether the status
    /// changed.
    pub(crate) fn set_status(&self, status: Status) -> bool {
        let mut state = self.state.lock();
        if state.status.is_terminal() {
            tracing::debug!(id = %self.id, current = %state.status, ignored = %status, "execution already finished");
            return false;
        }
        state.status = status;
        if status.is_terminal() {
            state.ended = Some(OffsetDateTime::now_utc());
        }
        self.status_send.send_replace(status);
        true
    }

    /// STARTING → STARTED; leaves any other status alone, so a stop requested while the job was
    /// still waiting for the configuration lock is not lost.
    pub(crate) fn start(&self) {
        let mut state = self.state.lock();
        if state.status == Status::Starting {
            state.status = Status::Started;
            self.status_send.send_replace(Status::Started);
        }
    }

    pub(crate) fn set_total_steps(&self, total: usize) {
        self.state.lock().total_steps = total;
    }

    pub(crate) fn step(&self) {
        self.state.lock().executed_steps += 1;
    }

    pub(crate) fn set_staged(&self, staged: BTreeMap<Kind, usize>) {
        self.state.lock().staged = staged;
    }
}
