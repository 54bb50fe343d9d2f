use integration_tests::*;
use strata_core::{catalog::Catalog, model::*};
use strata_jobs::Status;

async fn round_trip(archive_name: &str) {
    let source = sample_files(Fixture::new(sample_catalog()));
    let archive = source.path().join(archive_name);
    let backup = source
        .tracker
        .run_backup_async(&archive, false, Default::default())
        .unwrap();
    assert_eq!(source.finish(&backup).await, Status::Completed);

    let target = Fixture::new(Catalog::new());
    let restore = target
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    let status = target.finish(&restore).await;

    assert_eq!(status, Status::Completed, "{:?}", restore.failures());
    let original = sample_catalog();
    let restored = target.live();
    for kind in Kind::SEQUENCE {
        assert_eq!(restored.count(kind), original.count(kind), "{}", kind);
        assert_eq!(restore.staged()[&kind], original.count(kind), "{}", kind);
    }
    assert_eq!(restored.default_store("topp").unwrap().name, "postgis");
    assert_eq!(restored.default_store("nurc"), None);
    assert_eq!(
        std::fs::read_to_string(target.data_root().join("styles/raster.sld")).unwrap(),
        "<sld>raster</sld>"
    );
    assert_eq!(
        std::fs::read_to_string(target.data_root().join("workspaces/topp/header.ftl")).unwrap(),
        "TOPP"
    );
}

#[tokio::test]
async fn should_round_trip_through_zip() {
    round_trip("backup.zip").await;
}

#[tokio::test]
async fn should_round_trip_through_tar_bz2() {
    round_trip("backup.tar.bz2").await;
}

#[tokio::test]
async fn should_round_trip_through_directory() {
    let source = sample_files(Fixture::new(sample_catalog()));
    let archive = source.path().join("backup-dir");
    std::fs::create_dir(&archive).unwrap();
    let backup = source
        .tracker
        .run_backup_async(&archive, true, Default::default())
        .unwrap();
    assert_eq!(source.finish(&backup).await, Status::Completed);

    let target = Fixture::new(Catalog::new());
    let restore = target
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();

    assert_eq!(target.finish(&restore).await, Status::Completed);
    assert_eq!(target.live().len(), sample_catalog().len());
}
