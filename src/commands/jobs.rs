use super::report;
use crate::cli;
use dirs_next as dirs;
use eyre::WrapErr;
use std::{path::PathBuf, sync::Arc};
use strata_core::{catalog::LiveCatalog, config::AppConfig, layout, lock::ConfigLock};
use strata_jobs::{Execution, Parameters, Settings, Status, Tracker};

fn data_dir(config: &AppConfig) -> eyre::Result<PathBuf> {
    config
        .data_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|dir| dir.join("strata")))
        .ok_or_else(|| eyre::eyre!("no data directory configured"))
}

fn tracker(config: &AppConfig) -> eyre::Result<Tracker> {
    let data_dir = data_dir(config)?;
    let catalog = layout::load_catalog(&data_dir)
        .wrap_err_with(|| format!("failed to load catalog from {}", data_dir.display()))?;
    tracing::debug!(entities = catalog.len(), data_dir = %data_dir.display(), "loaded live catalog");
    let live = Arc::new(LiveCatalog::new(catalog, data_dir));
    Ok(Tracker::new(
        live,
        ConfigLock::new(),
        Settings::from_config(config),
    ))
}

fn check(execution: &Execution, status: Status) -> eyre::Result<()> {
    match status {
        Status::Completed => Ok(()),
        status => Err(eyre::eyre!(
            "{} {} finished as {}",
            execution.kind(),
            execution.id(),
            status
        )),
    }
}

pub async fn backup(config: &AppConfig, args: cli::backup::Cli) -> eyre::Result<()> {
    let parameters = Parameters::from_options(&config.jobs, args.job.to_options())?;
    let tracker = tracker(config)?;

    let execution = tracker.run_backup_async(&args.output, args.overwrite, parameters)?;
    let status = execution.wait_terminal().await;

    report::print(&execution)?;
    check(&execution, status)
}

pub async fn restore(config: &AppConfig, args: cli::restore::Cli) -> eyre::Result<()> {
    let parameters = Parameters::from_options(&config.jobs, args.job.to_options())?;
    let tracker = tracker(config)?;

    let execution = tracker.run_restore_async(&args.input, parameters)?;
    let status = execution.wait_terminal().await;

    if status == Status::Completed && !execution.parameters().dry_run {
        let live = tracker.live();
        layout::save_catalog(live.data_root(), &live.snapshot())
            .wrap_err("failed to save restored catalog")?;
        tracing::info!(data_dir = %live.data_root().display(), "saved restored catalog");
    }
    report::print(&execution)?;
    check(&execution, status)
}
