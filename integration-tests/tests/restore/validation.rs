use super::best_effort;
use integration_tests::*;
use strata_core::{catalog::Catalog, model::*};
use strata_jobs::{FailureKind, Status};

fn with_missing_store(dir: &std::path::Path) -> std::path::PathBuf {
    write_entities(
        dir,
        [
            Namespace::new("topp", "urn:topp").into(),
            Workspace::new("topp").into(),
            DataStore::new("topp", "postgis").into(),
            Resource::feature_type(data_store("topp", "postgis"), "a_roads").into(),
            Resource::feature_type(data_store("topp", "missing"), "b_rivers").into(),
            Resource::feature_type(data_store("topp", "postgis"), "c_lakes").into(),
        ],
    )
}

#[tokio::test]
async fn should_fail_on_missing_store_in_strict_mode() {
    let fixture = Fixture::new(Catalog::new());
    let archive = with_missing_store(&fixture.path().join("archive"));

    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Failed);
    let failures = execution.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::Validation);
    assert_eq!(failures[0].entity.as_deref(), Some("resource 'topp:b_rivers'"));
    assert!(fixture.live().is_empty());
}

#[tokio::test]
async fn should_skip_resource_with_missing_store_in_best_effort_mode() {
    let fixture = Fixture::new(Catalog::new());
    let archive = with_missing_store(&fixture.path().join("archive"));

    let execution = fixture
        .tracker
        .run_restore_async(&archive, best_effort())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Completed);
    let warnings = execution.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].entity.as_deref(), Some("resource 'topp:b_rivers'"));
    let live = fixture.live();
    assert!(live.resource_by_name("topp", "a_roads").is_some());
    assert!(live.resource_by_name("topp", "b_rivers").is_none());
    assert!(live.resource_by_name("topp", "c_lakes").is_some());
    assert_eq!(execution.executed_steps(), 6);
}

#[tokio::test]
async fn should_reject_duplicate_resource_name_in_namespace() {
    let fixture = Fixture::new(Catalog::new());
    let archive = write_entities(
        &fixture.path().join("archive"),
        [
            Namespace::new("topp", "urn:topp").into(),
            Workspace::new("topp").into(),
            DataStore::new("topp", "a_store").into(),
            DataStore::new("topp", "b_store").into(),
            Resource::feature_type(data_store("topp", "a_store"), "roads").into(),
            Resource::feature_type(data_store("topp", "b_store"), "roads").into(),
        ],
    );

    let execution = fixture
        .tracker
        .run_restore_async(&archive, best_effort())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Completed);
    let warnings = execution.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(
        warnings[0].message.contains("already has a resource"),
        "{}",
        warnings[0]
    );
    let roads = fixture.live().resource_by_name("topp", "roads").cloned().unwrap();
    assert_eq!(roads.store.unwrap().name, "a_store");
}

#[tokio::test]
async fn should_make_first_store_the_default() {
    let fixture = Fixture::new(Catalog::new());
    let archive = write_entities(
        &fixture.path().join("archive"),
        [
            Namespace::new("ws", "urn:ws").into(),
            Workspace::new("ws").into(),
            DataStore::new("ws", "a").into(),
            DataStore::new("ws", "b").into(),
        ],
    );

    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    fixture.finish(&execution).await;

    let live = fixture.live();
    let default = live.default_store("ws").unwrap();
    assert_eq!(default.name, "a");
    assert_eq!(default.id, live.data_stores()[0].id);
}

#[tokio::test]
async fn should_not_make_coverage_store_the_default() {
    let fixture = Fixture::new(Catalog::new());
    let archive = write_entities(
        &fixture.path().join("archive"),
        [
            Namespace::new("nurc", "urn:nurc").into(),
            Workspace::new("nurc").into(),
            CoverageStore::new("nurc", "dem", "file:///srv/dem.tif").into(),
        ],
    );

    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    assert_eq!(fixture.finish(&execution).await, Status::Completed);

    let live = fixture.live();
    assert_eq!(live.count(Kind::CoverageStore), 1);
    assert_eq!(live.default_store("nurc"), None);
}

#[tokio::test]
async fn should_reject_store_of_unknown_workspace() {
    let fixture = Fixture::new(Catalog::new());
    let archive = write_entities(
        &fixture.path().join("archive"),
        [DataStore::new("nowhere", "postgis").into()],
    );

    let execution = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();

    assert_eq!(fixture.finish(&execution).await, Status::Failed);
    assert_eq!(
        execution.failures()[0].message,
        "workspace 'nowhere' does not exist"
    );
}
