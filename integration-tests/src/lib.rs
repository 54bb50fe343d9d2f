use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use strata_core::{
    catalog::{Catalog, LiveCatalog},
    layout,
    lock::ConfigLock,
    model::*,
};
use strata_jobs::{Execution, Settings, Status, Tracker};
use tempfile::TempDir;

/// A tracker over an in-memory live catalog whose data and work directories live in a temporary
/// directory.
pub struct Fixture {
    dir: TempDir,
    pub lock: ConfigLock,
    pub tracker: Tracker,
}

impl Fixture {
    pub fn new(catalog: Catalog) -> Self {
        let dir = TempDir::new().unwrap();
        Self::with_data_root(dir, "data", catalog)
    }

    /// Like [`Fixture::new`], but the data root is `name` inside the fixture directory, which
    /// the caller may have prepared.
    pub fn with_data_root(dir: TempDir, name: &str, catalog: Catalog) -> Self {
        let lock = ConfigLock::new();
        let live = Arc::new(LiveCatalog::new(catalog, dir.path().join(name)));
        let settings = Settings {
            work_dir: dir.path().join("work"),
            upload_dir: dir.path().join("uploads"),
        };
        let tracker = Tracker::new(live, lock.clone(), settings);
        Fixture { dir, lock, tracker }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_root(&self) -> &Path {
        self.tracker.live().data_root()
    }

    pub fn live(&self) -> Catalog {
        self.tracker.live().snapshot()
    }

    pub fn with_file(self, relative: impl AsRef<Path>, contents: &str) -> Self {
        let path = self.data_root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }

    /// Waits for `execution` to end and for the tracker to free its running slot.
    pub async fn finish(&self, execution: &Execution) -> Status {
        let status = execution.wait_terminal().await;
        while self
            .tracker
            .running()
            .map_or(false, |running| running.id() == execution.id())
        {
            tokio::task::yield_now().await;
        }
        status
    }
}

/// Writes `catalog` in the catalog layout to `dir`, with a definition file for every style. The
/// directory can be restored from directly.
pub fn write_layout(dir: &Path, catalog: &Catalog) -> PathBuf {
    layout::save_catalog(dir, catalog).unwrap();
    for style in catalog.styles() {
        std::fs::write(
            layout::styles_dir(dir).join(&style.filename),
            format!("<sld>{}</sld>", style.name),
        )
        .unwrap();
    }
    dir.to_owned()
}

/// Writes entities as they are, without the catalog checking them first.
pub fn write_entities(dir: &Path, entities: impl IntoIterator<Item = Entity>) -> PathBuf {
    for entity in entities {
        layout::write_entity(dir, &entity).unwrap();
    }
    dir.to_owned()
}

pub fn data_store(workspace: &str, name: &str) -> StoreRef {
    StoreRef::new(workspace, name, StoreKind::Data)
}

/// Two workspaces with stores of both kinds, resources, layers, styles and groups; every entity
/// is valid.
pub fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    for ws in ["topp", "nurc"] {
        catalog
            .add(Namespace::new(ws, format!("http://{}.example.com", ws)))
            .unwrap();
        catalog.add(Workspace::new(ws)).unwrap();
    }

    catalog.add(DataStore::new("topp", "postgis")).unwrap();
    catalog.add(DataStore::new("topp", "shapes")).unwrap();
    catalog
        .add(CoverageStore::new("nurc", "dem", "file:///srv/dem.tif"))
        .unwrap();

    let resources = [
        Resource::feature_type(data_store("topp", "postgis"), "roads"),
        Resource::feature_type(data_store("topp", "shapes"), "rivers"),
        Resource::coverage(StoreRef::new("nurc", "dem", StoreKind::Coverage), "elevation"),
    ];
    for style in ["line", "raster"] {
        catalog.add(Style::new(style)).unwrap();
    }
    for resource in resources {
        let mut layer = Layer::for_resource(&resource);
        layer.default_style = Some(
            match resource.kind {
                ResourceKind::FeatureType => "line",
                ResourceKind::Coverage => "raster",
            }
            .to_owned(),
        );
        catalog.add(resource).unwrap();
        catalog.add(layer).unwrap();
    }

    catalog
        .add(LayerGroup::new(
            "basemap",
            vec![
                QualifiedName::new("topp", "roads"),
                QualifiedName::new("topp", "rivers"),
            ],
        ))
        .unwrap();
    catalog
}

/// Style definitions and templates for [`sample_catalog`].
pub fn sample_files(fixture: Fixture) -> Fixture {
    fixture
        .with_file("styles/line.sld", "<sld>line</sld>")
        .with_file("styles/raster.sld", "<sld>raster</sld>")
        .with_file(
            "workspaces/topp/stores/postgis/resources/roads/title.ftl",
            "Roads",
        )
        .with_file("workspaces/topp/header.ftl", "TOPP")
}
