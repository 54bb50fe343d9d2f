use integration_tests::*;
use strata_core::{
    archive::{self, ArchiveHandle},
    catalog::Catalog,
    layout,
    model::*,
};
use strata_jobs::{FailureKind, Parameters, Status};

mod round_trip;

#[tokio::test]
async fn should_write_archive_in_catalog_layout() {
    let fixture = sample_files(Fixture::new(sample_catalog()));
    let output = fixture.path().join("backup.zip");

    let execution = fixture
        .tracker
        .run_backup_async(&output, false, Parameters::default())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Completed, "{:?}", execution.failures());
    let extracted = fixture.path().join("extracted");
    std::fs::create_dir(&extracted).unwrap();
    archive::extract(&ArchiveHandle::resolve(&output).unwrap(), &extracted).unwrap();
    assert!(extracted
        .join("workspaces/topp/stores/postgis/resources/roads/featuretype.json")
        .is_file());
    assert_eq!(
        std::fs::read_to_string(extracted.join("styles/line.sld")).unwrap(),
        "<sld>line</sld>"
    );
    assert_eq!(
        std::fs::read_to_string(
            extracted.join("workspaces/topp/stores/postgis/resources/roads/title.ftl")
        )
        .unwrap(),
        "Roads"
    );
    assert_eq!(
        std::fs::read_to_string(extracted.join("workspaces/topp/header.ftl")).unwrap(),
        "TOPP"
    );
    // ids belong to the live catalog and are not archived
    let archived = layout::load_catalog(&extracted).unwrap();
    assert_eq!(archived.len(), sample_catalog().len());
}

#[tokio::test]
async fn should_count_every_entity_as_a_step() {
    let catalog = sample_catalog();
    let fixture = sample_files(Fixture::new(catalog.clone()));

    let execution = fixture
        .tracker
        .run_backup_async(fixture.path().join("backup.tgz"), false, Default::default())
        .unwrap();
    fixture.finish(&execution).await;

    assert_eq!(execution.total_steps(), catalog.len());
    assert_eq!(execution.executed_steps(), catalog.len());
}

#[tokio::test]
async fn should_fail_without_archive_when_style_file_is_missing() {
    let mut catalog = Catalog::new();
    catalog.add(Style::new("line")).unwrap();
    let fixture = Fixture::new(catalog);
    let output = fixture.path().join("backup.zip");

    let execution = fixture
        .tracker
        .run_backup_async(&output, false, Default::default())
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Failed);
    let failures = execution.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::Io);
    assert_eq!(failures[0].entity.as_deref(), Some("style 'line'"));
    assert!(!output.exists());
}

#[tokio::test]
async fn should_skip_missing_style_file_in_best_effort_mode() {
    let mut catalog = Catalog::new();
    catalog.add(Style::new("line")).unwrap();
    let fixture = Fixture::new(catalog);
    let output = fixture.path().join("backup.zip");
    let parameters = Parameters {
        best_effort: true,
        ..Default::default()
    };

    let execution = fixture
        .tracker
        .run_backup_async(&output, false, parameters)
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Completed);
    assert_eq!(execution.warnings().len(), 1);
    assert!(output.is_file());
}

#[tokio::test]
async fn should_not_write_archive_in_dry_run() {
    let fixture = sample_files(Fixture::new(sample_catalog()));
    let output = fixture.path().join("backup.zip");
    let parameters = Parameters {
        dry_run: true,
        ..Default::default()
    };

    let execution = fixture
        .tracker
        .run_backup_async(&output, false, parameters)
        .unwrap();
    let status = fixture.finish(&execution).await;

    assert_eq!(status, Status::Completed);
    assert_eq!(execution.executed_steps(), sample_catalog().len());
    assert!(!output.exists());
}
