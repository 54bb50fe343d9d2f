use super::{enabled_by_default, Id, StoreKind, StoreRef};
use serde::{Deserialize, Serialize};

/// A name qualified by the namespace prefix it lives in.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        QualifiedName {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    FeatureType,
    Coverage,
}

impl ResourceKind {
    pub fn store_kind(&self) -> StoreKind {
        match self {
            ResourceKind::FeatureType => StoreKind::Data,
            ResourceKind::Coverage => StoreKind::Coverage,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "native_name")]
    pub native_name: Option<String>,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreRef>,
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl Resource {
    pub fn feature_type(store: StoreRef, name: impl Into<String>) -> Self {
        Self::new(store, name, ResourceKind::FeatureType)
    }

    pub fn coverage(store: StoreRef, name: impl Into<String>) -> Self {
        Self::new(store, name, ResourceKind::Coverage)
    }

    fn new(store: StoreRef, name: impl Into<String>, kind: ResourceKind) -> Self {
        Resource {
            id: None,
            name: name.into(),
            native_name: None,
            namespace: store.workspace.clone(),
            store: Some(store),
            kind,
            title: None,
            srs: None,
            enabled: true,
        }
    }

    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.namespace, &self.name)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Layer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    pub resource: QualifiedName,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "default_style")]
    pub default_style: Option<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl Layer {
    pub fn for_resource(resource: &Resource) -> Self {
        Layer {
            id: None,
            name: resource.name.clone(),
            resource: resource.qualified_name(),
            default_style: None,
            styles: vec![],
            enabled: true,
        }
    }

    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.resource.namespace, &self.name)
    }
}
