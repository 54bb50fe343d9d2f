use super::Catalog;
use crate::model::{Entity, Kind};

#[derive(Debug, thiserror::Error)]
#[error("{subject} is invalid: {}", .errors.join("; "))]
pub struct ValidationError {
    pub subject: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    subject: String,
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn throw_if_invalid(self) -> Result<(), ValidationError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationError {
                subject: self.subject,
                errors: self.errors,
            })
        }
    }
}

impl Catalog {
    /// Checks `entity` against this catalog. `is_new` means the entity is about to be added and
    /// skips the extended pass, which checks style references and that the entity is already
    /// present under its id.
    pub fn validate(&self, entity: &Entity, is_new: bool) -> ValidationResult {
        let mut errors = Vec::new();

        if entity.name().trim().is_empty() {
            errors.push("name is empty".to_owned());
        }
        if let Some(other) = self.same_name_id(entity) {
            if entity.id() != Some(other) {
                errors.push(format!("name is already used by '{}'", other));
            }
        }

        self.check_references(entity, &mut errors);
        if !is_new {
            self.check_extended(entity, &mut errors);
        }

        ValidationResult {
            subject: entity.label(),
            errors,
        }
    }

    fn check_references(&self, entity: &Entity, errors: &mut Vec<String>) {
        match entity {
            Entity::Namespace(ns) => {
                if ns.uri.trim().is_empty() {
                    errors.push("namespace uri is empty".to_owned());
                }
            }
            Entity::Workspace(_) => {}
            Entity::DataStore(store) => {
                if self.workspace_by_name(&store.workspace.name).is_none() {
                    errors.push(format!("workspace '{}' does not exist", store.workspace.name));
                }
            }
            Entity::CoverageStore(store) => {
                if self.workspace_by_name(&store.workspace.name).is_none() {
                    errors.push(format!("workspace '{}' does not exist", store.workspace.name));
                }
                if store.url.trim().is_empty() {
                    errors.push("coverage url is empty".to_owned());
                }
            }
            Entity::Resource(resource) => {
                if self.namespace_by_prefix(&resource.namespace).is_none() {
                    errors.push(format!("namespace '{}' does not exist", resource.namespace));
                }
                match &resource.store {
                    Some(store) if store.kind != resource.kind.store_kind() => {
                        errors.push(format!("{} cannot publish {:?}", store.kind, resource.kind))
                    }
                    Some(store) => {
                        if self
                            .store_by_name(&store.workspace, &store.name, store.kind)
                            .is_none()
                        {
                            errors.push(format!("{} '{}' does not exist", store.kind, store));
                        }
                    }
                    None => errors.push("no store set".to_owned()),
                }
            }
            Entity::Layer(layer) => {
                if self
                    .resource_by_name(&layer.resource.namespace, &layer.resource.name)
                    .is_none()
                {
                    errors.push(format!("resource '{}' does not exist", layer.resource));
                }
            }
            Entity::Style(style) => {
                if style.filename.trim().is_empty() {
                    errors.push("style file name is empty".to_owned());
                }
            }
            Entity::LayerGroup(group) => {
                if let Some(ws) = &group.workspace {
                    if self.workspace_by_name(ws).is_none() {
                        errors.push(format!("workspace '{}' does not exist", ws));
                    }
                }
                if group.layers.is_empty() {
                    errors.push("layer group has no layers".to_owned());
                }
                for layer in &group.layers {
                    if self.layer_by_name(layer).is_none() {
                        errors.push(format!("layer '{}' does not exist", layer));
                    }
                }
                if !group.styles.is_empty() && group.styles.len() != group.layers.len() {
                    errors.push(format!(
                        "{} styles given for {} layers",
                        group.styles.len(),
                        group.layers.len()
                    ));
                }
            }
        }
    }

    fn check_extended(&self, entity: &Entity, errors: &mut Vec<String>) {
        match entity.id() {
            Some(id) if !self.contains_id(entity.kind(), id) => {
                errors.push(format!("no {} with id '{}' in catalog", entity.kind(), id))
            }
            Some(_) => {}
            None => errors.push("no id set".to_owned()),
        }

        let styles: Vec<&str> = match entity {
            Entity::Layer(layer) => layer
                .default_style
                .iter()
                .chain(layer.styles.iter())
                .map(String::as_str)
                .collect(),
            Entity::LayerGroup(group) => group.styles.iter().flatten().map(String::as_str).collect(),
            _ => vec![],
        };
        for style in styles {
            if self.style_by_name(style).is_none() {
                errors.push(format!("{} '{}' does not exist", Kind::Style, style));
            }
        }
    }
}
