use super::{cancellation, runner::Context, Failure, FailureKind, RestoreSpec};
use crate::{
    execution::Execution,
    pipeline::{
        resources::ResourceContext, writer::CatalogWriter, ItemStage, Outcome, Resources, Source,
    },
};
use std::{collections::BTreeMap, path::Path};
use strata_core::{archive, catalog::Catalog, layout, lock::Mode, model::Kind};

fn io_failure(error: &(dyn std::error::Error + 'static)) -> Failure {
    Failure::from_error(FailureKind::Io, error)
}

/// Copies staged sidecar files into the data root, then makes `staging` the live catalog. Files
/// the copy overwrites are saved below `saved`; a failed copy is undone, leaving both the data
/// root and the live catalog as they were.
async fn swap_in(
    context: &Context,
    staging: Catalog,
    resources: &Path,
    saved: &Path,
) -> Result<(), Failure> {
    let data_root = context.live.data_root().to_owned();
    let source = resources.to_owned();
    let saved = saved.to_owned();
    tokio::task::spawn_blocking(move || archive::overlay_tree(&source, &data_root, &saved))
        .await
        .map_err(|e| Failure::from_error(FailureKind::SwapIn, &e))?
        .map_err(|e| Failure::from_error(FailureKind::SwapIn, &e))?;

    let old = context.live.replace(staging);
    tracing::info!(replaced = old.len(), "swapped in restored catalog");
    Ok(())
}

/// Extracts the input archive and rebuilds a catalog from it in isolation. The live catalog only
/// changes at swap-in, after every entity has been staged.
pub(super) async fn run(
    context: &Context,
    execution: &Execution,
    spec: &RestoreSpec,
    cancellation: &mut cancellation::Recv,
) -> Result<Outcome, Failure> {
    let _guard = context.lock.lock(Mode::Write).await;
    execution.start();

    let work_dir = &context.settings.work_dir;
    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| io_failure(&e))?;
    let tmp = tempfile::Builder::new()
        .prefix("restore-")
        .tempdir_in(work_dir)
        .map_err(|e| io_failure(&e))?;
    let extracted = tmp.path().join("archive");
    let staged_resources = tmp.path().join("resources");
    for dir in [&extracted, &staged_resources] {
        tokio::fs::create_dir(dir)
            .await
            .map_err(|e| io_failure(&e))?;
    }

    archive::spawn_extract(spec.archive.clone(), extracted.clone())
        .await
        .map_err(|e| io_failure(&e))?;
    tracing::debug!(archive = %spec.archive, "extracted archive");
    if !layout::contains_catalog(&extracted).map_err(|e| io_failure(&e))? {
        return Err(Failure::new(
            FailureKind::Io,
            format!("archive {} holds no catalog entities", spec.archive),
        ));
    }

    let dry_run = execution.parameters().dry_run;
    let resources = if dry_run {
        None
    } else {
        Some(Resources::new(ResourceContext {
            source_root: extracted.clone(),
            dest_root: staged_resources.clone(),
        }))
    };
    let mut stage = ItemStage::new(execution, cancellation, CatalogWriter::new(), resources);
    let outcome = stage.run(Source::Dir(&extracted))?;
    let staging = stage.into_writer().into_catalog();
    execution.set_staged(
        Kind::SEQUENCE
            .into_iter()
            .map(|kind| (kind, staging.count(kind)))
            .collect::<BTreeMap<_, _>>(),
    );

    if let Outcome::Stopped(_) = outcome {
        return Ok(outcome);
    }
    if dry_run {
        tracing::info!(staged = staging.len(), "dry run, not swapping in");
        return Ok(outcome);
    }

    swap_in(context, staging, &staged_resources, &tmp.path().join("replaced")).await?;
    Ok(outcome)
}
