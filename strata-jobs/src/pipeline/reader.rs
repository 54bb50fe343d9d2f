use std::path::{Path, PathBuf};
use strata_core::{
    catalog::Catalog,
    layout,
    model::{Entity, Kind},
};

#[derive(Debug, thiserror::Error)]
#[error("could not read catalog items")]
pub struct ReadError(#[from] layout::Error);

#[derive(Debug)]
enum Items {
    Entities(std::vec::IntoIter<Entity>),
    Files(std::vec::IntoIter<PathBuf>),
}

/// Forward-only, single-pass sequence of the entities of one kind. The set of items is fixed when
/// the stream is opened.
#[derive(Debug)]
pub struct ItemStream {
    kind: Kind,
    len: usize,
    items: Items,
    closed: bool,
}

impl ItemStream {
    /// Entities of `kind` in `catalog`, in enumeration order.
    pub fn from_catalog(catalog: &Catalog, kind: Kind) -> Self {
        let entities = catalog.list(kind);
        ItemStream {
            kind,
            len: entities.len(),
            items: Items::Entities(entities.into_iter()),
            closed: false,
        }
    }

    /// Serialized entities of `kind` below `root`, in path order. Files are parsed as they are
    /// reached.
    pub fn from_dir(root: &Path, kind: Kind) -> Result<Self, ReadError> {
        let files = layout::list(root, kind)?;
        Ok(ItemStream {
            kind,
            len: files.len(),
            items: Items::Files(files.into_iter()),
            closed: false,
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Number of items the stream was opened with.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn close(mut self) {
        self.closed = true;
        tracing::trace!(kind = %self.kind, "closed item stream");
    }
}

impl Iterator for ItemStream {
    type Item = Result<Entity, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.items {
            Items::Entities(entities) => entities.next().map(Ok),
            Items::Files(files) => {
                let kind = self.kind;
                files
                    .next()
                    .map(|path| layout::read_entity(kind, &path).map_err(ReadError::from))
            }
        }
    }
}

impl Drop for ItemStream {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!(kind = %self.kind, "item stream dropped without being closed");
        }
    }
}
