use super::Catalog;
use crate::model::{Entity, Kind};
use parking_lot::{RwLock, RwLockReadGuard};
use std::path::{Path, PathBuf};

/// The catalog being served, together with the data directory holding its sidecar files.
#[derive(Debug)]
pub struct LiveCatalog {
    catalog: RwLock<Catalog>,
    data_root: PathBuf,
}

impl LiveCatalog {
    pub fn new(catalog: Catalog, data_root: impl Into<PathBuf>) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn read(&self) -> RwLockReadGuard<Catalog> {
        self.catalog.read()
    }

    pub fn snapshot(&self) -> Catalog {
        self.catalog.read().clone()
    }

    pub fn list(&self, kind: Kind) -> Vec<Entity> {
        self.catalog.read().list(kind)
    }

    /// Makes `catalog` the live catalog and returns the one it replaced.
    pub fn replace(&self, catalog: Catalog) -> Catalog {
        let mut guard = self.catalog.write();
        tracing::debug!(
            old = guard.len(),
            new = catalog.len(),
            "replacing live catalog"
        );
        std::mem::replace(&mut *guard, catalog)
    }
}
