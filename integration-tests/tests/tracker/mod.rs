use integration_tests::*;
use std::sync::Arc;
use strata_core::{catalog::Catalog, lock::Mode};
use strata_jobs::{tracker::AdmissionError, Execution, JobKind, Status};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_admit_exactly_one_of_concurrent_jobs() {
    let fixture = sample_files(Fixture::new(sample_catalog()));
    let archive = write_layout(&fixture.path().join("archive"), &sample_catalog());
    let guard = fixture.lock.lock(Mode::Write).await;

    let attempts = (0..8)
        .map(|i| {
            let tracker = fixture.tracker.clone();
            let output = fixture.path().join(format!("backup-{}.zip", i));
            let input = archive.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    tracker.run_backup_async(output, false, Default::default())
                } else {
                    tracker.run_restore_async(input, Default::default())
                }
            })
        })
        .collect::<Vec<_>>();
    let results = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect::<Vec<_>>();

    let admitted = results
        .iter()
        .filter_map(|result| result.as_ref().ok())
        .collect::<Vec<_>>();
    assert_eq!(admitted.len(), 1);
    let admitted: Arc<Execution> = admitted[0].clone();
    for result in &results {
        match result {
            Ok(_) => {}
            Err(AdmissionError::AlreadyRunning { id, kind }) => {
                assert_eq!(*id, admitted.id());
                assert_eq!(*kind, admitted.kind());
            }
            Err(error) => panic!("unexpected error {}", error),
        }
    }
    let running = fixture
        .tracker
        .executions()
        .into_iter()
        .filter(|execution| execution.status().is_running())
        .count();
    assert_eq!(running, 1);

    drop(guard);
    assert_eq!(fixture.finish(&admitted).await, Status::Completed);
}

#[tokio::test]
async fn should_admit_next_job_once_previous_finished() {
    let fixture = sample_files(Fixture::new(sample_catalog()));
    let archive = fixture.path().join("backup.zip");

    let backup = fixture
        .tracker
        .run_backup_async(&archive, false, Default::default())
        .unwrap();
    fixture.finish(&backup).await;
    let restore = fixture
        .tracker
        .run_restore_async(&archive, Default::default())
        .unwrap();
    fixture.finish(&restore).await;

    let executions = fixture.tracker.executions();
    assert_eq!(executions.len(), 2);
    assert_eq!(executions[0].kind(), JobKind::Backup);
    assert_eq!(executions[1].kind(), JobKind::Restore);
    assert_eq!(restore.status(), Status::Completed);
    assert!(fixture.tracker.running().is_none());
}

#[tokio::test]
async fn should_restore_uploaded_archive() {
    let source = sample_files(Fixture::new(sample_catalog()));
    let output = source.path().join("backup.tar");
    let backup = source
        .tracker
        .run_backup_async(&output, false, Default::default())
        .unwrap();
    source.finish(&backup).await;
    let download = source.tracker.backup_archive(backup.id()).unwrap();

    let target = Fixture::new(Catalog::new());
    let file = tokio::fs::File::open(download.path()).await.unwrap();
    let upload = target
        .tracker
        .receive_upload(file, "nightly.tar")
        .await
        .unwrap();
    let restore = target
        .tracker
        .run_restore_async(upload.path(), Default::default())
        .unwrap();

    assert_eq!(target.finish(&restore).await, Status::Completed);
    assert!(upload.path().starts_with(target.path().join("uploads")));
    assert_eq!(target.live().len(), sample_catalog().len());
}
