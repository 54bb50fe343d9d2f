use integration_tests::*;
use maplit::btreemap;
use strata_core::{
    archive::{self, ArchiveHandle},
    catalog::Catalog,
    lock::Mode,
    model::*,
};
use strata_jobs::{FailureKind, Parameters, Status};

mod validation;

fn best_effort() -> Parameters {
    Parameters {
        best_effort: true,
        ..Default::default()
    }
}

/// A live catalog that must survive failed or stopped restores.
fn live_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add(Namespace::new("live", "urn:live")).unwrap();
    catalog.add(Workspace::new("live")).unwrap();
    catalog
}

#[tokio::test]
async fn should_replace_live_catalog_on_success() {
    let fixture = Fixture::new(live_catalog());
    let archive = write_layout(&fixture.path().join("archive"), &sample_catalog());
    let before = fixture.live();

    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Completed, "{:?}", execution.failures());
    let after = fixture.live();
    assert_ne!(after, before);
    assert!(after.workspace_by_name("live").is_none());
    assert_eq!(after.len(), sample_catalog().len());
}

#[tokio::test]
async fn should_leave_live_catalog_untouched_on_failure() {
    let fixture = Fixture::new(live_catalog());
    let archive = write_entities(
        &fixture.path().join("archive"),
        [
            Namespace::new("topp", "urn:topp").into(),
            Workspace::new("topp").into(),
            Resource::feature_type(data_store("topp", "missing"), "roads").into(),
        ],
    );
    let before = fixture.live();

    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Failed);
    assert_eq!(fixture.live(), before);
    assert!(!fixture.data_root().exists());
}

#[tokio::test]
async fn should_leave_live_catalog_untouched_when_stopped() {
    let fixture = Fixture::new(live_catalog());
    let archive = write_layout(&fixture.path().join("archive"), &sample_catalog());
    let before = fixture.live();
    let guard = fixture.lock.lock(Mode::Read).await;
    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();

    let stop = tokio::spawn({
        let tracker = fixture.tracker.clone();
        let id = execution.id();
        async move { tracker.stop(id).await }
    });
    while execution.status() != Status::Stopping {
        tokio::task::yield_now().await;
    }
    assert_eq!(fixture.live(), before);
    drop(guard);
    stop.await.unwrap().unwrap();

    assert_eq!(fixture.finish(&execution).await, Status::Stopped);
    assert_eq!(fixture.live(), before);
}

#[tokio::test]
async fn should_validate_without_swapping_in_during_dry_run() {
    let fixture = Fixture::new(live_catalog());
    let archive = write_layout(&fixture.path().join("archive"), &sample_catalog());
    let before = fixture.live();
    let parameters = Parameters {
        dry_run: true,
        ..Default::default()
    };

    let execution = fixture
        .tracker
        .run_restore_async(&archive, parameters)
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Completed);
    assert_eq!(execution.executed_steps(), sample_catalog().len());
    assert_eq!(
        execution.staged(),
        btreemap! {
            Kind::Namespace => 2,
            Kind::Workspace => 2,
            Kind::DataStore => 2,
            Kind::CoverageStore => 1,
            Kind::Resource => 3,
            Kind::Layer => 3,
            Kind::Style => 2,
            Kind::LayerGroup => 1,
        }
    );
    assert_eq!(fixture.live(), before);
}

#[tokio::test]
async fn should_fail_swap_in_without_touching_live_catalog() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("data"), "not a directory").unwrap();
    let fixture = Fixture::with_data_root(dir, "data", live_catalog());
    let archive = write_layout(&fixture.path().join("archive"), &sample_catalog());
    let before = fixture.live();

    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Failed);
    let failures = execution.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::SwapIn);
    assert_eq!(fixture.live(), before);
}

#[tokio::test]
async fn should_put_back_overwritten_files_when_swap_in_fails() {
    let fixture = Fixture::new(live_catalog()).with_file("styles/line.sld", "<sld>live</sld>");
    std::fs::create_dir_all(fixture.data_root().join("styles/raster.sld")).unwrap();
    let archive = write_layout(&fixture.path().join("archive"), &sample_catalog());
    let before = fixture.live();

    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Failed);
    assert_eq!(execution.failures()[0].kind, FailureKind::SwapIn);
    assert_eq!(fixture.live(), before);
    assert_eq!(
        std::fs::read_to_string(fixture.data_root().join("styles/line.sld")).unwrap(),
        "<sld>live</sld>"
    );
    assert!(fixture.data_root().join("styles/raster.sld").is_dir());
}

async fn restore_without_catalog(fixture: &Fixture, archive: &ArchiveHandle) {
    let before = fixture.live();

    let execution = fixture
        .tracker
        .run_restore_async(archive.path(), best_effort())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Failed);
    let failures = execution.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::Io);
    assert_eq!(execution.total_steps(), 0);
    assert_eq!(fixture.live(), before);
}

#[tokio::test]
async fn should_fail_on_archive_with_catalog_below_top_level_folder() {
    let fixture = Fixture::new(live_catalog());
    let nested = fixture.path().join("nested");
    write_layout(&nested.join("backup"), &sample_catalog());
    let archive = ArchiveHandle::resolve(fixture.path().join("nested.zip")).unwrap();
    archive::compress(&nested, &archive).unwrap();

    restore_without_catalog(&fixture, &archive).await;
}

#[tokio::test]
async fn should_fail_on_archive_without_entities() {
    let fixture = Fixture::new(live_catalog());
    let contents = fixture.path().join("contents");
    std::fs::create_dir_all(contents.join("styles")).unwrap();
    std::fs::write(contents.join("styles/line.sld"), "<sld/>").unwrap();
    std::fs::write(contents.join("README"), "nothing to see").unwrap();
    let archive = ArchiveHandle::resolve(fixture.path().join("empty.tar.gz")).unwrap();
    archive::compress(&contents, &archive).unwrap();

    restore_without_catalog(&fixture, &archive).await;
}

#[tokio::test]
async fn should_fail_on_corrupt_archive_regardless_of_policy() {
    let fixture = Fixture::new(live_catalog());
    let archive = fixture.path().join("backup.zip");
    std::fs::write(&archive, "this is not a zip file").unwrap();

    let execution = fixture
        .tracker
        .run_restore_async(&archive, best_effort())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Failed);
    assert_eq!(execution.failures()[0].kind, FailureKind::Io);
    assert_eq!(execution.total_steps(), 0);
}
