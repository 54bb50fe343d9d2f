use super::{backup, cancellation, restore, Spec, Status};
use crate::{execution::Execution, pipeline::Outcome, Settings};
use std::sync::Arc;
use strata_core::{catalog::LiveCatalog, lock::ConfigLock};

/// What a running job needs from the process around it.
#[derive(Debug)]
pub(crate) struct Context {
    pub(crate) live: Arc<LiveCatalog>,
    pub(crate) lock: ConfigLock,
    pub(crate) settings: Settings,
}

/// Drives one execution to a terminal status. Returns the stop request if the job was stopped,
/// so the caller can decide about a restart before acknowledging it.
#[tracing::instrument(name = "job", skip_all, fields(id = %execution.id(), kind = %execution.kind()))]
pub(crate) async fn run(
    context: Arc<Context>,
    execution: Arc<Execution>,
    mut cancellation: cancellation::Recv,
) -> Option<cancellation::Request> {
    tracing::info!(archive = %execution.archive(), "starting");
    let result = match execution.spec() {
        Spec::Backup(spec) => backup::run(&context, &execution, spec, &mut cancellation).await,
        Spec::Restore(spec) => restore::run(&context, &execution, spec, &mut cancellation).await,
    };

    match result {
        Ok(Outcome::Completed) => {
            let warnings = execution.warnings().len();
            if warnings > 0 {
                tracing::warn!(warnings, "finished with warnings");
            } else {
                tracing::info!("finished successfully");
            }
            execution.set_status(Status::Completed);
            None
        }
        Ok(Outcome::Stopped(request)) => {
            tracing::info!(reason = ?request.reason, "stopped");
            execution.set_status(Status::Stopped);
            Some(request)
        }
        Err(failure) => {
            tracing::error!(%failure, "failed");
            execution.add_failure_exceptions([failure]);
            execution.set_status(Status::Failed);
            None
        }
    }
}
