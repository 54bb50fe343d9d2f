use crate::model::{
    CoverageStore, DataStore, Entity, Id, Kind, Layer, LayerGroup, Namespace, QualifiedName,
    Resource, StoreKind, StoreRef, Style, Workspace,
};
use std::collections::BTreeMap;

mod live;
mod validate;

pub use live::LiveCatalog;
pub use validate::{ValidationError, ValidationResult};

#[derive(Debug, thiserror::Error)]
pub enum AddError {
    #[error("{kind} with id '{id}' already exists")]
    DuplicateId { kind: Kind, id: Id },
    #[error("{label} already exists")]
    DuplicateName { label: String },
}

/// In-memory catalog. Entities of each kind are kept in insertion order, which is the order they
/// are enumerated in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    namespaces: Vec<Namespace>,
    workspaces: Vec<Workspace>,
    data_stores: Vec<DataStore>,
    coverage_stores: Vec<CoverageStore>,
    resources: Vec<Resource>,
    layers: Vec<Layer>,
    styles: Vec<Style>,
    layer_groups: Vec<LayerGroup>,
    default_stores: BTreeMap<String, StoreRef>,
}

impl Catalog {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn list(&self, kind: Kind) -> Vec<Entity> {
        fn cloned<T: Clone + Into<Entity>>(items: &[T]) -> Vec<Entity> {
            items.iter().cloned().map(Into::into).collect()
        }

        match kind {
            Kind::Namespace => cloned(&self.namespaces),
            Kind::Workspace => cloned(&self.workspaces),
            Kind::DataStore => cloned(&self.data_stores),
            Kind::CoverageStore => cloned(&self.coverage_stores),
            Kind::Resource => cloned(&self.resources),
            Kind::Layer => cloned(&self.layers),
            Kind::Style => cloned(&self.styles),
            Kind::LayerGroup => cloned(&self.layer_groups),
        }
    }

    pub fn count(&self, kind: Kind) -> usize {
        match kind {
            Kind::Namespace => self.namespaces.len(),
            Kind::Workspace => self.workspaces.len(),
            Kind::DataStore => self.data_stores.len(),
            Kind::CoverageStore => self.coverage_stores.len(),
            Kind::Resource => self.resources.len(),
            Kind::Layer => self.layers.len(),
            Kind::Style => self.styles.len(),
            Kind::LayerGroup => self.layer_groups.len(),
        }
    }

    pub fn len(&self) -> usize {
        Kind::SEQUENCE.iter().map(|kind| self.count(*kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entities, kind by kind in [`Kind::SEQUENCE`].
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        Kind::SEQUENCE
            .into_iter()
            .flat_map(move |kind| self.list(kind))
    }

    pub fn contains_id(&self, kind: Kind, id: &Id) -> bool {
        fn has<'a>(mut ids: impl Iterator<Item = Option<&'a Id>>, id: &Id) -> bool {
            ids.any(|candidate| candidate == Some(id))
        }

        match kind {
            Kind::Namespace => has(self.namespaces.iter().map(|e| e.id.as_ref()), id),
            Kind::Workspace => has(self.workspaces.iter().map(|e| e.id.as_ref()), id),
            Kind::DataStore => has(self.data_stores.iter().map(|e| e.id.as_ref()), id),
            Kind::CoverageStore => has(self.coverage_stores.iter().map(|e| e.id.as_ref()), id),
            Kind::Resource => has(self.resources.iter().map(|e| e.id.as_ref()), id),
            Kind::Layer => has(self.layers.iter().map(|e| e.id.as_ref()), id),
            Kind::Style => has(self.styles.iter().map(|e| e.id.as_ref()), id),
            Kind::LayerGroup => has(self.layer_groups.iter().map(|e| e.id.as_ref()), id),
        }
    }

    /// Adds an entity, allocating an id if it has none. Only id and name uniqueness are enforced
    /// here; use [`Catalog::validate`] for everything else.
    pub fn add(&mut self, entity: impl Into<Entity>) -> Result<Id, AddError> {
        let mut entity = entity.into();
        let kind = entity.kind();
        if let Some(id) = entity.id() {
            if self.contains_id(kind, id) {
                return Err(AddError::DuplicateId {
                    kind,
                    id: id.clone(),
                });
            }
        }
        if self.same_name_id(&entity).is_some() {
            return Err(AddError::DuplicateName {
                label: entity.label(),
            });
        }

        let id = entity
            .id_mut()
            .get_or_insert_with(|| Id::generate(kind))
            .clone();
        tracing::trace!(%id, entity = entity.label(), "adding to catalog");
        match entity {
            Entity::Namespace(e) => self.namespaces.push(e),
            Entity::Workspace(e) => self.workspaces.push(e),
            Entity::DataStore(e) => self.data_stores.push(e),
            Entity::CoverageStore(e) => self.coverage_stores.push(e),
            Entity::Resource(e) => self.resources.push(e),
            Entity::Layer(e) => self.layers.push(e),
            Entity::Style(e) => self.styles.push(e),
            Entity::LayerGroup(e) => self.layer_groups.push(e),
        }
        Ok(id)
    }

    /// Id of the entity that has the same name in the same scope as `entity`.
    fn same_name_id(&self, entity: &Entity) -> Option<&Id> {
        match entity {
            Entity::Namespace(e) => self.namespace_by_prefix(&e.prefix).and_then(|o| o.id.as_ref()),
            Entity::Workspace(e) => self.workspace_by_name(&e.name).and_then(|o| o.id.as_ref()),
            Entity::DataStore(DataStore {
                name, workspace, ..
            })
            | Entity::CoverageStore(CoverageStore {
                name, workspace, ..
            }) => self
                .data_store_by_name(&workspace.name, name)
                .and_then(|o| o.id.as_ref())
                .or_else(|| {
                    self.coverage_store_by_name(&workspace.name, name)
                        .and_then(|o| o.id.as_ref())
                }),
            Entity::Resource(e) => self
                .resource_by_name(&e.namespace, &e.name)
                .and_then(|o| o.id.as_ref()),
            Entity::Layer(e) => self
                .layer_by_name(&e.qualified_name())
                .and_then(|o| o.id.as_ref()),
            Entity::Style(e) => self.style_by_name(&e.name).and_then(|o| o.id.as_ref()),
            Entity::LayerGroup(e) => self
                .layer_group_by_name(e.workspace.as_deref(), &e.name)
                .and_then(|o| o.id.as_ref()),
        }
    }

    pub fn namespace_by_prefix(&self, prefix: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.prefix == prefix)
    }

    pub fn workspace_by_name(&self, name: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|ws| ws.name == name)
    }

    pub fn data_store_by_name(&self, workspace: &str, name: &str) -> Option<&DataStore> {
        self.data_stores
            .iter()
            .find(|s| s.workspace.name == workspace && s.name == name)
    }

    pub fn coverage_store_by_name(&self, workspace: &str, name: &str) -> Option<&CoverageStore> {
        self.coverage_stores
            .iter()
            .find(|s| s.workspace.name == workspace && s.name == name)
    }

    /// Canonical reference to the store of the given kind, including its id.
    pub fn store_by_name(&self, workspace: &str, name: &str, kind: StoreKind) -> Option<StoreRef> {
        match kind {
            StoreKind::Data => self.data_store_by_name(workspace, name).map(|s| s.to_ref()),
            StoreKind::Coverage => self
                .coverage_store_by_name(workspace, name)
                .map(|s| s.to_ref()),
        }
    }

    pub fn resource_by_store(&self, store: &StoreRef, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| {
            r.name == name
                && r.store.as_ref().map_or(false, |s| {
                    s.workspace == store.workspace && s.name == store.name && s.kind == store.kind
                })
        })
    }

    pub fn resource_by_name(&self, namespace: &str, name: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.namespace == namespace && r.name == name)
    }

    pub fn layer_by_name(&self, name: &QualifiedName) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|l| l.resource.namespace == name.namespace && l.name == name.name)
    }

    pub fn style_by_name(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name == name)
    }

    pub fn layer_group_by_name(&self, workspace: Option<&str>, name: &str) -> Option<&LayerGroup> {
        self.layer_groups
            .iter()
            .find(|g| g.workspace.as_deref() == workspace && g.name == name)
    }

    pub fn default_store(&self, workspace: &str) -> Option<&StoreRef> {
        self.default_stores.get(workspace)
    }

    pub fn set_default_store(&mut self, workspace: &str, store: StoreRef) {
        tracing::debug!(workspace, %store, "setting default store");
        self.default_stores.insert(workspace.to_owned(), store);
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn data_stores(&self) -> &[DataStore] {
        &self.data_stores
    }

    pub fn coverage_stores(&self) -> &[CoverageStore] {
        &self.coverage_stores
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn layer_groups(&self) -> &[LayerGroup] {
        &self.layer_groups
    }
}
