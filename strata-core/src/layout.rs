//! On-disk layout of a catalog, shared by backup archives and the data directory.
//!
//! ```text
//! workspaces/<prefix>/namespace.json
//! workspaces/<ws>/workspace.json
//! workspaces/<ws>/stores/<store>/datastore.json
//! workspaces/<ws>/stores/<store>/coveragestore.json
//! workspaces/<ws>/stores/<store>/resources/<resource>/featuretype.json
//! workspaces/<ws>/stores/<store>/resources/<resource>/coverage.json
//! workspaces/<prefix>/layers/<layer>.json
//! workspaces/<ws>/layergroups/<group>.json
//! layergroups/<group>.json
//! styles/<style>.json
//! styles/<style file>
//! ```

use crate::catalog::{AddError, Catalog};
use crate::model::{Entity, Kind, ResourceKind, StoreRef};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const WORKSPACES_DIR: &str = "workspaces";
pub const STYLES_DIR: &str = "styles";
pub const LAYER_GROUPS_DIR: &str = "layergroups";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("could not parse {}", .0.display())]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("could not serialize {0}")]
    Serialize(String, #[source] serde_json::Error),
    #[error("error walking {}", .0.display())]
    Walk(PathBuf, #[source] walkdir::Error),
    #[error("{0} has no place in the catalog layout")]
    Unplaceable(String),
    #[error("could not load catalog entity")]
    Add(#[from] AddError),
}

pub fn workspace_dir(root: &Path, workspace: &str) -> PathBuf {
    root.join(WORKSPACES_DIR).join(workspace)
}

pub fn store_dir(root: &Path, store: &StoreRef) -> PathBuf {
    workspace_dir(root, &store.workspace)
        .join("stores")
        .join(&store.name)
}

pub fn resource_dir(root: &Path, store: &StoreRef, resource: &str) -> PathBuf {
    store_dir(root, store).join("resources").join(resource)
}

pub fn styles_dir(root: &Path) -> PathBuf {
    root.join(STYLES_DIR)
}

/// Path of the file holding `entity`, relative to the layout root.
pub fn entity_path(entity: &Entity) -> Result<PathBuf, Error> {
    for name in names_used(entity) {
        if !is_safe_segment(name) {
            return Err(Error::Unplaceable(entity.label()));
        }
    }

    let root = Path::new("");
    let path = match entity {
        Entity::Namespace(ns) => workspace_dir(root, &ns.prefix).join("namespace.json"),
        Entity::Workspace(ws) => workspace_dir(root, &ws.name).join("workspace.json"),
        Entity::DataStore(store) => store_dir(root, &store.to_ref()).join("datastore.json"),
        Entity::CoverageStore(store) => store_dir(root, &store.to_ref()).join("coveragestore.json"),
        Entity::Resource(resource) => {
            let store = resource
                .store
                .as_ref()
                .ok_or_else(|| Error::Unplaceable(entity.label()))?;
            let file = match resource.kind {
                ResourceKind::FeatureType => "featuretype.json",
                ResourceKind::Coverage => "coverage.json",
            };
            resource_dir(root, store, &resource.name).join(file)
        }
        Entity::Layer(layer) => workspace_dir(root, &layer.resource.namespace)
            .join("layers")
            .join(format!("{}.json", layer.name)),
        Entity::Style(style) => styles_dir(root).join(format!("{}.json", style.name)),
        Entity::LayerGroup(group) => {
            let dir = match &group.workspace {
                Some(ws) => workspace_dir(root, ws).join(LAYER_GROUPS_DIR),
                None => root.join(LAYER_GROUPS_DIR),
            };
            dir.join(format!("{}.json", group.name))
        }
    };
    Ok(path)
}

fn names_used(entity: &Entity) -> Vec<&str> {
    let mut names = vec![entity.name()];
    match entity {
        Entity::DataStore(store) => names.push(&store.workspace.name),
        Entity::CoverageStore(store) => names.push(&store.workspace.name),
        Entity::Resource(resource) => {
            if let Some(store) = &resource.store {
                names.push(&store.workspace);
                names.push(&store.name);
            }
        }
        Entity::Layer(layer) => names.push(&layer.resource.namespace),
        Entity::LayerGroup(group) => names.extend(group.workspace.as_deref()),
        Entity::Namespace(_) | Entity::Workspace(_) | Entity::Style(_) => {}
    }
    names
}

fn is_safe_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn matches_kind(relative: &Path, kind: Kind) -> bool {
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str().unwrap_or_default())
        .collect::<Vec<_>>();

    match (kind, parts.as_slice()) {
        (Kind::Namespace, [WORKSPACES_DIR, _, "namespace.json"]) => true,
        (Kind::Workspace, [WORKSPACES_DIR, _, "workspace.json"]) => true,
        (Kind::DataStore, [WORKSPACES_DIR, _, "stores", _, "datastore.json"]) => true,
        (Kind::CoverageStore, [WORKSPACES_DIR, _, "stores", _, "coveragestore.json"]) => true,
        (
            Kind::Resource,
            [WORKSPACES_DIR, _, "stores", _, "resources", _, "featuretype.json" | "coverage.json"],
        ) => true,
        (Kind::Layer, [WORKSPACES_DIR, _, "layers", file]) => file.ends_with(".json"),
        (Kind::Style, [STYLES_DIR, file]) => file.ends_with(".json"),
        (Kind::LayerGroup, [LAYER_GROUPS_DIR, file]) => file.ends_with(".json"),
        (Kind::LayerGroup, [WORKSPACES_DIR, _, LAYER_GROUPS_DIR, file]) => file.ends_with(".json"),
        _ => false,
    }
}

/// Files holding entities of `kind` below `root`, sorted by path.
pub fn list(root: &Path, kind: Kind) -> Result<Vec<PathBuf>, Error> {
    if !root.exists() {
        return Ok(vec![]);
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Walk(root.to_owned(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            if matches_kind(relative, kind) {
                paths.push(entry.path().to_owned());
            }
        }
    }
    Ok(paths)
}

/// Whether any file below `root` sits where the layout keeps an entity.
pub fn contains_catalog(root: &Path) -> Result<bool, Error> {
    if !root.exists() {
        return Ok(false);
    }

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| Error::Walk(root.to_owned(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            if Kind::SEQUENCE
                .into_iter()
                .any(|kind| matches_kind(relative, kind))
            {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn parse<T: DeserializeOwned + Into<Entity>>(path: &Path, data: &str) -> Result<Entity, Error> {
    serde_json::from_str::<T>(data)
        .map(Into::into)
        .map_err(|e| Error::Parse(path.to_owned(), e))
}

pub fn read_entity(kind: Kind, path: &Path) -> Result<Entity, Error> {
    use crate::model::*;

    let data = std::fs::read_to_string(path).map_err(|e| Error::Io(path.to_owned(), e))?;
    match kind {
        Kind::Namespace => parse::<Namespace>(path, &data),
        Kind::Workspace => parse::<Workspace>(path, &data),
        Kind::DataStore => parse::<DataStore>(path, &data),
        Kind::CoverageStore => parse::<CoverageStore>(path, &data),
        Kind::Resource => parse::<Resource>(path, &data),
        Kind::Layer => parse::<Layer>(path, &data),
        Kind::Style => parse::<Style>(path, &data),
        Kind::LayerGroup => parse::<LayerGroup>(path, &data),
    }
}

fn to_json(entity: &Entity) -> serde_json::Result<String> {
    match entity {
        Entity::Namespace(e) => serde_json::to_string_pretty(e),
        Entity::Workspace(e) => serde_json::to_string_pretty(e),
        Entity::DataStore(e) => serde_json::to_string_pretty(e),
        Entity::CoverageStore(e) => serde_json::to_string_pretty(e),
        Entity::Resource(e) => serde_json::to_string_pretty(e),
        Entity::Layer(e) => serde_json::to_string_pretty(e),
        Entity::Style(e) => serde_json::to_string_pretty(e),
        Entity::LayerGroup(e) => serde_json::to_string_pretty(e),
    }
}

/// Serializes `entity` into its file below `root` and returns the file's path.
pub fn write_entity(root: &Path, entity: &Entity) -> Result<PathBuf, Error> {
    let path = root.join(entity_path(entity)?);
    let json = to_json(entity).map_err(|e| Error::Serialize(entity.label(), e))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Io(parent.to_owned(), e))?;
    }
    std::fs::write(&path, json).map_err(|e| Error::Io(path.clone(), e))?;
    Ok(path)
}

/// Loads every entity below `root`. The first data store of each workspace becomes its default.
pub fn load_catalog(root: &Path) -> Result<Catalog, Error> {
    let mut catalog = Catalog::new();
    for kind in Kind::SEQUENCE {
        for path in list(root, kind)? {
            let entity = read_entity(kind, &path)?;
            let id = catalog.add(entity.clone())?;
            if let Entity::DataStore(mut store) = entity {
                store.id = Some(id);
                if catalog.default_store(&store.workspace.name).is_none() {
                    catalog.set_default_store(&store.workspace.name, store.to_ref());
                }
            }
        }
    }
    tracing::debug!(root = %root.display(), entities = catalog.len(), "loaded catalog");
    Ok(catalog)
}

/// Replaces the entity files below `root` with the contents of `catalog`. Other files, such as
/// style definitions and templates, are left alone.
pub fn save_catalog(root: &Path, catalog: &Catalog) -> Result<(), Error> {
    for kind in Kind::SEQUENCE {
        for path in list(root, kind)? {
            std::fs::remove_file(&path).map_err(|e| Error::Io(path.clone(), e))?;
        }
    }
    for entity in catalog.entities() {
        write_entity(root, &entity)?;
    }
    Ok(())
}
