use super::processor::Target;
use crate::job::FailureKind;
use std::path::{Path, PathBuf};
use strata_core::{
    catalog::{AddError, Catalog},
    layout,
    model::{Entity, StoreRef},
};

/// Writing `entities[index]` failed; the entities before it were written.
#[derive(Debug, thiserror::Error)]
#[error("could not write {entity}")]
pub struct WriteError {
    pub index: usize,
    pub entity: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl WriteError {
    fn new(
        index: usize,
        entity: &Entity,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        WriteError {
            index,
            entity: entity.label(),
            source: Box::new(source),
        }
    }

    /// Entities accepted in the same chunk are only checked against each other when they are
    /// added, so a duplicate among them is rejected here rather than by the processor.
    pub fn failure_kind(&self) -> FailureKind {
        match self.source.downcast_ref::<AddError>() {
            Some(_) => FailureKind::Validation,
            None => FailureKind::Io,
        }
    }
}

/// Applies already validated entities to a target. Writers don't know about dependencies between
/// kinds; callers hand them entities in [`strata_core::model::Kind::SEQUENCE`] order.
pub trait ItemWriter {
    /// The catalog entities are validated against before being written here.
    fn target(&mut self) -> Target<'_>;

    fn write(&mut self, entities: &[Entity]) -> Result<(), WriteError>;
}

/// Adds entities to a restore's staging catalog.
#[derive(Debug, Default)]
pub struct CatalogWriter {
    catalog: Catalog,
}

impl CatalogWriter {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// The processor marks stores as default before they have an id; fill it in once they do.
    fn refresh_default_store(&mut self, store: StoreRef) {
        let is_default = self.catalog.default_store(&store.workspace).map_or(false, |default| {
            default.id.is_none() && default.name == store.name && default.kind == store.kind
        });
        if is_default {
            let workspace = store.workspace.clone();
            self.catalog.set_default_store(&workspace, store);
        }
    }
}

impl ItemWriter for CatalogWriter {
    fn target(&mut self) -> Target<'_> {
        Target::Staging(&mut self.catalog)
    }

    fn write(&mut self, entities: &[Entity]) -> Result<(), WriteError> {
        for (index, entity) in entities.iter().enumerate() {
            let id = self
                .catalog
                .add(entity.clone())
                .map_err(|e| WriteError::new(index, entity, e))?;
            if let Entity::DataStore(store) = entity {
                let mut store = store.to_ref();
                store.id = Some(id);
                self.refresh_default_store(store);
            }
        }
        Ok(())
    }
}

/// Serializes entities into a backup's working directory.
#[derive(Debug)]
pub struct ArchiveWriter<'a> {
    catalog: &'a Catalog,
    root: PathBuf,
}

impl<'a> ArchiveWriter<'a> {
    /// `catalog` is the live catalog snapshot being backed up.
    pub fn new(catalog: &'a Catalog, root: impl Into<PathBuf>) -> Self {
        ArchiveWriter {
            catalog,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ItemWriter for ArchiveWriter<'_> {
    fn target(&mut self) -> Target<'_> {
        Target::Live(self.catalog)
    }

    fn write(&mut self, entities: &[Entity]) -> Result<(), WriteError> {
        for (index, entity) in entities.iter().enumerate() {
            let path = layout::write_entity(&self.root, entity)
                .map_err(|e| WriteError::new(index, entity, e))?;
            tracing::trace!(path = %path.display(), "wrote {}", entity.label());
        }
        Ok(())
    }
}

/// Validates against the wrapped writer's target but writes nothing.
#[derive(Debug)]
pub struct DryRun<W>(pub W);

impl<W: ItemWriter> ItemWriter for DryRun<W> {
    fn target(&mut self) -> Target<'_> {
        self.0.target()
    }

    fn write(&mut self, entities: &[Entity]) -> Result<(), WriteError> {
        tracing::trace!(count = entities.len(), "dry run, not writing");
        Ok(())
    }
}
