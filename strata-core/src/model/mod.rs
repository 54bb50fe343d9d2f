use serde::{Deserialize, Serialize};

mod resource;
mod store;
mod style;
mod workspace;

pub use resource::{Layer, QualifiedName, Resource, ResourceKind};
pub use store::{CoverageStore, DataStore, StoreKind, StoreRef, WorkspaceRef};
pub use style::{LayerGroup, Style};
pub use workspace::{Namespace, Workspace};

/// Object id of a catalog entity.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub String);

impl Id {
    pub fn generate(kind: Kind) -> Self {
        Id(format!("{}-{}", kind.label(), uuid::Uuid::new_v4()))
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    Namespace,
    Workspace,
    DataStore,
    CoverageStore,
    Resource,
    Layer,
    Style,
    LayerGroup,
}

impl Kind {
    /// Order in which entity kinds are read and written: every kind only refers to kinds before
    /// it, except layers which may refer to styles.
    pub const SEQUENCE: [Kind; 8] = [
        Kind::Namespace,
        Kind::Workspace,
        Kind::DataStore,
        Kind::CoverageStore,
        Kind::Resource,
        Kind::Layer,
        Kind::Style,
        Kind::LayerGroup,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Kind::Namespace => "namespace",
            Kind::Workspace => "workspace",
            Kind::DataStore => "datastore",
            Kind::CoverageStore => "coveragestore",
            Kind::Resource => "resource",
            Kind::Layer => "layer",
            Kind::Style => "style",
            Kind::LayerGroup => "layergroup",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Entity {
    Namespace(Namespace),
    Workspace(Workspace),
    DataStore(DataStore),
    CoverageStore(CoverageStore),
    Resource(Resource),
    Layer(Layer),
    Style(Style),
    LayerGroup(LayerGroup),
}

impl Entity {
    pub fn kind(&self) -> Kind {
        match self {
            Entity::Namespace(_) => Kind::Namespace,
            Entity::Workspace(_) => Kind::Workspace,
            Entity::DataStore(_) => Kind::DataStore,
            Entity::CoverageStore(_) => Kind::CoverageStore,
            Entity::Resource(_) => Kind::Resource,
            Entity::Layer(_) => Kind::Layer,
            Entity::Style(_) => Kind::Style,
            Entity::LayerGroup(_) => Kind::LayerGroup,
        }
    }

    pub fn id(&self) -> Option<&Id> {
        match self {
            Entity::Namespace(e) => e.id.as_ref(),
            Entity::Workspace(e) => e.id.as_ref(),
            Entity::DataStore(e) => e.id.as_ref(),
            Entity::CoverageStore(e) => e.id.as_ref(),
            Entity::Resource(e) => e.id.as_ref(),
            Entity::Layer(e) => e.id.as_ref(),
            Entity::Style(e) => e.id.as_ref(),
            Entity::LayerGroup(e) => e.id.as_ref(),
        }
    }

    pub(crate) fn id_mut(&mut self) -> &mut Option<Id> {
        match self {
            Entity::Namespace(e) => &mut e.id,
            Entity::Workspace(e) => &mut e.id,
            Entity::DataStore(e) => &mut e.id,
            Entity::CoverageStore(e) => &mut e.id,
            Entity::Resource(e) => &mut e.id,
            Entity::Layer(e) => &mut e.id,
            Entity::Style(e) => &mut e.id,
            Entity::LayerGroup(e) => &mut e.id,
        }
    }

    /// The name identifying the entity within its scope; the prefix for namespaces.
    pub fn name(&self) -> &str {
        match self {
            Entity::Namespace(e) => &e.prefix,
            Entity::Workspace(e) => &e.name,
            Entity::DataStore(e) => &e.name,
            Entity::CoverageStore(e) => &e.name,
            Entity::Resource(e) => &e.name,
            Entity::Layer(e) => &e.name,
            Entity::Style(e) => &e.name,
            Entity::LayerGroup(e) => &e.name,
        }
    }

    /// Human-readable reference used in logs, warnings and failures.
    pub fn label(&self) -> String {
        match self {
            Entity::DataStore(e) => format!("{} '{}:{}'", self.kind(), e.workspace.name, e.name),
            Entity::CoverageStore(e) => {
                format!("{} '{}:{}'", self.kind(), e.workspace.name, e.name)
            }
            Entity::Resource(e) => format!("{} '{}:{}'", self.kind(), e.namespace, e.name),
            Entity::Layer(e) => format!("{} '{}:{}'", self.kind(), e.resource.namespace, e.name),
            _ => format!("{} '{}'", self.kind(), self.name()),
        }
    }

    /// Removes the object id and the ids held by references, which are only meaningful inside the
    /// catalog that allocated them.
    pub fn without_ids(mut self) -> Self {
        *self.id_mut() = None;
        match &mut self {
            Entity::DataStore(e) => e.workspace.id = None,
            Entity::CoverageStore(e) => e.workspace.id = None,
            Entity::Resource(e) => {
                if let Some(store) = &mut e.store {
                    store.id = None;
                }
            }
            Entity::Namespace(_)
            | Entity::Workspace(_)
            | Entity::Layer(_)
            | Entity::Style(_)
            | Entity::LayerGroup(_) => {}
        }
        self
    }
}

macro_rules! entity_from {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for Entity {
                fn from(e: $variant) -> Self {
                    Entity::$variant(e)
                }
            }
        )+
    };
}

entity_from!(Namespace, Workspace, DataStore, CoverageStore, Resource, Layer, Style, LayerGroup);

fn enabled_by_default() -> bool {
    true
}
