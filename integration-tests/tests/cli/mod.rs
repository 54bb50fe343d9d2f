use assert_cmd::Command;
use std::path::{Path, PathBuf};
use strata_core::{catalog::Catalog, layout, model::*};
use tempfile::TempDir;

struct Workdir {
    dir: TempDir,
}

impl Workdir {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let work_dir = dir.path().join("work");
        std::fs::write(
            dir.path().join("strata.toml"),
            format!("work-dir = {:?}\n", work_dir.display().to_string()),
        )
        .unwrap();
        Workdir { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn data_dir(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    fn cmd(&self, data_dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("test-strata").unwrap();
        cmd.env_remove("STRATA_DATA_DIR")
            .arg("--config-file")
            .arg(self.path().join("strata.toml"))
            .arg("--data-dir")
            .arg(data_dir);
        cmd
    }
}

fn sample_catalog(data_dir: &Path) {
    let mut catalog = Catalog::new();
    catalog.add(Namespace::new("topp", "urn:topp")).unwrap();
    catalog.add(Workspace::new("topp")).unwrap();
    catalog.add(DataStore::new("topp", "postgis")).unwrap();
    let store = StoreRef::new("topp", "postgis", StoreKind::Data);
    let roads = Resource::feature_type(store, "roads");
    catalog.add(Layer::for_resource(&roads)).unwrap();
    catalog.add(roads).unwrap();
    catalog.add(Style::new("line")).unwrap();
    layout::save_catalog(data_dir, &catalog).unwrap();
    std::fs::write(layout::styles_dir(data_dir).join("line.sld"), "<sld/>").unwrap();
}

#[test]
fn should_print_effective_configuration() {
    let workdir = Workdir::new();
    std::fs::write(
        workdir.path().join("strata.toml"),
        "data-dir = \"/srv/strata\"\n\n[jobs]\nbest_effort = true\n",
    )
    .unwrap();

    let output = Command::cargo_bin("test-strata")
        .unwrap()
        .arg("--config-file")
        .arg(workdir.path().join("strata.toml"))
        .arg("config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains("data-dir = \"/srv/strata\""));
    assert!(stdout.contains("best-effort = true"));
    assert!(stdout.contains("chunk-size = 1"));
}

#[test]
fn should_restore_what_was_backed_up() {
    let workdir = Workdir::new();
    let source = workdir.data_dir("source");
    let target = workdir.data_dir("target");
    sample_catalog(&source);
    let archive = workdir.path().join("backup.tar.gz");

    workdir
        .cmd(&source)
        .arg("backup")
        .arg("--output")
        .arg(&archive)
        .assert()
        .success();
    workdir
        .cmd(&target)
        .arg("restore")
        .arg("--input")
        .arg(&archive)
        .assert()
        .success();

    let restored = layout::load_catalog(&target).unwrap();
    assert_eq!(restored.count(Kind::Workspace), 1);
    assert_eq!(restored.count(Kind::Resource), 1);
    assert_eq!(restored.count(Kind::Layer), 1);
    assert_eq!(
        std::fs::read_to_string(layout::styles_dir(&target).join("line.sld")).unwrap(),
        "<sld/>"
    );
}

#[test]
fn should_not_touch_data_dir_in_dry_run() {
    let workdir = Workdir::new();
    let source = workdir.data_dir("source");
    let target = workdir.data_dir("target");
    sample_catalog(&source);
    let archive = workdir.path().join("backup.zip");
    workdir
        .cmd(&source)
        .args(["backup", "--output"])
        .arg(&archive)
        .assert()
        .success();

    workdir
        .cmd(&target)
        .args(["restore", "--dry-run", "--input"])
        .arg(&archive)
        .assert()
        .success();

    assert!(!target.exists());
}

#[test]
fn should_refuse_to_overwrite_archive() {
    let workdir = Workdir::new();
    let source = workdir.data_dir("source");
    sample_catalog(&source);
    let archive = workdir.path().join("backup.zip");
    std::fs::write(&archive, "keep me").unwrap();

    workdir
        .cmd(&source)
        .args(["backup", "--output"])
        .arg(&archive)
        .assert()
        .failure();

    assert_eq!(std::fs::read_to_string(&archive).unwrap(), "keep me");
}

#[test]
fn should_fail_restore_of_missing_archive() {
    let workdir = Workdir::new();

    workdir
        .cmd(&workdir.data_dir("target"))
        .args(["restore", "--input"])
        .arg(workdir.path().join("missing.zip"))
        .assert()
        .failure();
}

#[test]
fn should_fail_on_invalid_job_option() {
    let workdir = Workdir::new();
    let source = workdir.data_dir("source");
    sample_catalog(&source);

    workdir
        .cmd(&source)
        .args(["backup", "--option", "chunk-size=0", "--output"])
        .arg(workdir.path().join("backup.zip"))
        .assert()
        .failure();
}
