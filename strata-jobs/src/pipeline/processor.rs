use crate::job::{Failure, FailureKind};
use strata_core::{
    catalog::{Catalog, ValidationError},
    model::{Entity, Id, StoreRef, WorkspaceRef},
};

/// The catalog entities are checked against.
#[derive(Debug)]
pub enum Target<'a> {
    /// the live catalog, read-only; used by backups
    Live(&'a Catalog),
    /// a restore's private staging catalog
    Staging(&'a mut Catalog),
}

impl Target<'_> {
    pub fn catalog(&self) -> &Catalog {
        match self {
            Target::Live(catalog) => catalog,
            Target::Staging(catalog) => catalog,
        }
    }

    /// Whether entities are about to be added to the target rather than already part of it.
    pub fn is_new(&self) -> bool {
        matches!(self, Target::Staging(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("no namespace with prefix '{prefix}'")]
    MissingNamespace { entity: String, prefix: String },
    #[error("workspace '{workspace}' does not exist")]
    MissingWorkspace { entity: String, workspace: String },
    #[error("no store set")]
    MissingStoreReference { entity: String },
    #[error("{} '{store}' does not exist", .store.kind)]
    MissingStore { entity: String, store: StoreRef },
    #[error("{} '{store}' already has a resource with this name ('{existing}')", .store.kind)]
    DuplicateInStore {
        entity: String,
        store: StoreRef,
        existing: Id,
    },
    #[error("namespace '{namespace}' already has a resource with this name ('{existing}')")]
    DuplicateInNamespace {
        entity: String,
        namespace: String,
        existing: Id,
    },
    #[error("{}", .0.errors.join("; "))]
    Invalid(ValidationError),
}

impl Rejection {
    pub fn entity(&self) -> &str {
        match self {
            Rejection::MissingNamespace { entity, .. }
            | Rejection::MissingWorkspace { entity, .. }
            | Rejection::MissingStoreReference { entity }
            | Rejection::MissingStore { entity, .. }
            | Rejection::DuplicateInStore { entity, .. }
            | Rejection::DuplicateInNamespace { entity, .. } => entity,
            Rejection::Invalid(error) => &error.subject,
        }
    }
}

impl From<Rejection> for Failure {
    fn from(rejection: Rejection) -> Self {
        Failure::new(FailureKind::Validation, rejection.to_string()).with_entity(rejection.entity())
    }
}

#[derive(Debug)]
pub enum Verdict {
    Accept(Entity),
    Reject(Rejection),
}

/// Checks one entity against `target`. Data stores accepted into a staging catalog become the
/// default store of their workspace if it has none yet; coverage stores never do. Entities accepted from the live catalog lose their
/// ids, which only mean something inside the catalog that allocated them.
pub fn process(entity: Entity, mut target: Target<'_>) -> Verdict {
    let is_new = target.is_new();
    let label = entity.label();
    let checked = match entity {
        Entity::Workspace(workspace) => {
            if target.catalog().namespace_by_prefix(&workspace.name).is_none() {
                Err(Rejection::MissingNamespace {
                    entity: label,
                    prefix: workspace.name,
                })
            } else {
                Ok(Entity::from(workspace))
            }
        }
        Entity::DataStore(mut store) => {
            rebind_workspace(&mut store.workspace, target.catalog(), label)
                .map(|()| Entity::from(store))
        }
        Entity::CoverageStore(mut store) => {
            rebind_workspace(&mut store.workspace, target.catalog(), label)
                .map(|()| Entity::from(store))
        }
        Entity::Resource(mut resource) => {
            let catalog = target.catalog();
            let canonical = match &resource.store {
                None => Err(Rejection::MissingStoreReference {
                    entity: label.clone(),
                }),
                Some(store) => catalog
                    .store_by_name(&store.workspace, &store.name, store.kind)
                    .ok_or_else(|| Rejection::MissingStore {
                        entity: label.clone(),
                        store: store.clone(),
                    }),
            };
            canonical.and_then(|canonical| {
                let in_store = catalog
                    .resource_by_store(&canonical, &resource.name)
                    .filter(|existing| existing.id != resource.id)
                    .and_then(|existing| existing.id.clone());
                let in_namespace = catalog
                    .resource_by_name(&resource.namespace, &resource.name)
                    .filter(|existing| existing.id != resource.id)
                    .and_then(|existing| existing.id.clone());
                if let Some(existing) = in_store {
                    Err(Rejection::DuplicateInStore {
                        entity: label,
                        store: canonical,
                        existing,
                    })
                } else if let Some(existing) = in_namespace {
                    Err(Rejection::DuplicateInNamespace {
                        entity: label,
                        namespace: resource.namespace.clone(),
                        existing,
                    })
                } else {
                    resource.store = Some(canonical);
                    Ok(Entity::from(resource))
                }
            })
        }
        entity @ (Entity::Namespace(_)
        | Entity::Layer(_)
        | Entity::Style(_)
        | Entity::LayerGroup(_)) => Ok(entity),
    };

    let entity = match checked.and_then(|entity| {
        target
            .catalog()
            .validate(&entity, is_new)
            .throw_if_invalid()
            .map(|()| entity)
            .map_err(Rejection::Invalid)
    }) {
        Ok(entity) => entity,
        Err(rejection) => return Verdict::Reject(rejection),
    };

    match &mut target {
        Target::Staging(catalog) => {
            if let Entity::DataStore(store) = &entity {
                if catalog.default_store(&store.workspace.name).is_none() {
                    catalog.set_default_store(&store.workspace.name, store.to_ref());
                }
            }
            Verdict::Accept(entity)
        }
        Target::Live(_) => Verdict::Accept(entity.without_ids()),
    }
}

fn rebind_workspace(
    workspace: &mut WorkspaceRef,
    catalog: &Catalog,
    label: String,
) -> Result<(), Rejection> {
    match catalog.workspace_by_name(&workspace.name) {
        Some(canonical) => {
            workspace.id = canonical.id.clone();
            Ok(())
        }
        None => Err(Rejection::MissingWorkspace {
            entity: label,
            workspace: workspace.name.clone(),
        }),
    }
}
