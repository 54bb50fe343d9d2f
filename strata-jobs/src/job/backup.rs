use super::{cancellation, runner::Context, BackupSpec, Failure, FailureKind};
use crate::{
    execution::Execution,
    pipeline::{
        resources::ResourceContext,
        writer::{ArchiveWriter, DryRun},
        ItemStage, Outcome, Resources, Source,
    },
};
use strata_core::{archive, lock::Mode};

fn io_failure(error: &(dyn std::error::Error + 'static)) -> Failure {
    Failure::from_error(FailureKind::Io, error)
}

/// Serializes a snapshot of the live catalog into a working directory, then packs it into the
/// output archive.
pub(super) async fn run(
    context: &Context,
    execution: &Execution,
    spec: &BackupSpec,
    cancellation: &mut cancellation::Recv,
) -> Result<Outcome, Failure> {
    let _guard = context.lock.lock(Mode::Read).await;
    execution.start();

    let work_dir = &context.settings.work_dir;
    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| io_failure(&e))?;
    let tmp = tempfile::Builder::new()
        .prefix("backup-")
        .tempdir_in(work_dir)
        .map_err(|e| io_failure(&e))?;
    tracing::debug!(work_dir = %tmp.path().display(), "created working directory");

    let dry_run = execution.parameters().dry_run;
    let snapshot = context.live.snapshot();
    let outcome = {
        let writer = ArchiveWriter::new(&snapshot, tmp.path());
        if dry_run {
            ItemStage::new(execution, cancellation, DryRun(writer), None)
                .run(Source::Catalog(&snapshot))?
        } else {
            let resources = Resources::new(ResourceContext {
                source_root: context.live.data_root().to_owned(),
                dest_root: tmp.path().to_owned(),
            });
            ItemStage::new(execution, cancellation, writer, Some(resources))
                .run(Source::Catalog(&snapshot))?
        }
    };

    if let Outcome::Stopped(_) = outcome {
        return Ok(outcome);
    }
    if dry_run {
        tracing::info!("dry run, not writing archive");
        return Ok(outcome);
    }

    archive::spawn_compress(tmp.path().to_owned(), spec.archive.clone())
        .await
        .map_err(|e| io_failure(&e))?;
    tracing::info!(archive = %spec.archive, "wrote archive");
    Ok(outcome)
}
