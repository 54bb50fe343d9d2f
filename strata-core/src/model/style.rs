use super::{Id, QualifiedName};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    #[serde(default = "Style::default_format")]
    pub format: String,
    /// Name of the style definition file in the `styles` directory.
    pub filename: String,
}

impl Style {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Style {
            id: None,
            filename: format!("{}.sld", name),
            name,
            format: Self::default_format(),
        }
    }

    fn default_format() -> String {
        "sld".to_owned()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayerGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub layers: Vec<QualifiedName>,
    /// Per-layer style overrides; `None` uses the layer's default style.
    #[serde(default)]
    pub styles: Vec<Option<String>>,
}

impl LayerGroup {
    pub fn new(name: impl Into<String>, layers: Vec<QualifiedName>) -> Self {
        LayerGroup {
            id: None,
            name: name.into(),
            workspace: None,
            title: None,
            layers,
            styles: vec![],
        }
    }
}
