use super::{enabled_by_default, Id};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
}

impl WorkspaceRef {
    pub fn named(name: impl Into<String>) -> Self {
        WorkspaceRef {
            id: None,
            name: name.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    Data,
    Coverage,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Data => f.write_str("data store"),
            StoreKind::Coverage => f.write_str("coverage store"),
        }
    }
}

/// Reference from a resource to the store it is published from.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub workspace: String,
    pub name: String,
    pub kind: StoreKind,
}

impl StoreRef {
    pub fn new(workspace: impl Into<String>, name: impl Into<String>, kind: StoreKind) -> Self {
        StoreRef {
            id: None,
            workspace: workspace.into(),
            name: name.into(),
            kind,
        }
    }
}

impl std::fmt::Display for StoreRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.workspace, self.name)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    pub workspace: WorkspaceRef,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "connection_parameters")]
    pub connection_parameters: BTreeMap<String, String>,
}

impl DataStore {
    pub fn new(workspace: impl Into<String>, name: impl Into<String>) -> Self {
        DataStore {
            id: None,
            name: name.into(),
            workspace: WorkspaceRef::named(workspace),
            enabled: true,
            description: None,
            connection_parameters: BTreeMap::new(),
        }
    }

    pub fn to_ref(&self) -> StoreRef {
        StoreRef {
            id: self.id.clone(),
            workspace: self.workspace.name.clone(),
            name: self.name.clone(),
            kind: StoreKind::Data,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoverageStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    pub workspace: WorkspaceRef,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl CoverageStore {
    pub fn new(
        workspace: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        CoverageStore {
            id: None,
            name: name.into(),
            workspace: WorkspaceRef::named(workspace),
            enabled: true,
            url: url.into(),
            format: None,
        }
    }

    pub fn to_ref(&self) -> StoreRef {
        StoreRef {
            id: self.id.clone(),
            workspace: self.workspace.name.clone(),
            name: self.name.clone(),
            kind: StoreKind::Coverage,
        }
    }
}
