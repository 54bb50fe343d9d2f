use std::path::{Component, Path, PathBuf};
use strata_core::{layout, model::Entity};

/// Presentation templates a resource may carry.
pub const TEMPLATES: [&str; 9] = [
    "header.ftl",
    "footer.ftl",
    "content.ftl",
    "title.ftl",
    "link.ftl",
    "description.ftl",
    "height.ftl",
    "time.ftl",
    "shapezip.ftl",
];

/// Where sidecar files are copied from and to. Both roots use the catalog layout.
#[derive(Debug, Clone)]
pub struct ResourceContext {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("style file {} does not exist", .0.display())]
    MissingStyleFile(PathBuf),
    #[error("style file name '{0}' points outside the styles directory")]
    InvalidStyleFile(String),
    #[error("could not copy {} to {}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Copies files belonging to an entity alongside its serialized form.
pub trait AdditionalResources: std::fmt::Debug + Send + Sync {
    fn can_handle(&self, entity: &Entity) -> bool;

    fn write(&self, ctx: &ResourceContext, entity: &Entity) -> Result<(), ResourceError>;
}

fn copy_file(from: &Path, to: &Path) -> Result<(), ResourceError> {
    let copy_error = |source| ResourceError::Copy {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    };
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(copy_error)?;
    }
    std::fs::copy(from, to).map_err(copy_error)?;
    Ok(())
}

/// The definition file of a style, kept in the `styles` directory.
#[derive(Debug)]
pub struct StyleFiles;

impl AdditionalResources for StyleFiles {
    fn can_handle(&self, entity: &Entity) -> bool {
        matches!(entity, Entity::Style(_))
    }

    fn write(&self, ctx: &ResourceContext, entity: &Entity) -> Result<(), ResourceError> {
        let style = match entity {
            Entity::Style(style) => style,
            _ => return Ok(()),
        };
        let relative = Path::new(&style.filename);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(ResourceError::InvalidStyleFile(style.filename.clone()));
        }

        let from = layout::styles_dir(&ctx.source_root).join(relative);
        if !from.is_file() {
            return Err(ResourceError::MissingStyleFile(from));
        }
        copy_file(&from, &layout::styles_dir(&ctx.dest_root).join(relative))
    }
}

/// Templates of a resource. Each template is looked up in the resource's directory, then its
/// store's, then its workspace's; the first one found is copied to the same relative place.
#[derive(Debug)]
pub struct ResourceTemplates;

impl AdditionalResources for ResourceTemplates {
    fn can_handle(&self, entity: &Entity) -> bool {
        matches!(entity, Entity::Resource(r) if r.store.is_some())
    }

    fn write(&self, ctx: &ResourceContext, entity: &Entity) -> Result<(), ResourceError> {
        let (resource, store) = match entity {
            Entity::Resource(resource) => match &resource.store {
                Some(store) => (resource, store),
                None => return Ok(()),
            },
            _ => return Ok(()),
        };
        let root = &ctx.source_root;
        let lookup = [
            layout::resource_dir(root, store, &resource.name),
            layout::store_dir(root, store),
            layout::workspace_dir(root, &store.workspace),
        ];

        for template in TEMPLATES {
            let found = lookup
                .iter()
                .map(|dir| dir.join(template))
                .find(|path| path.is_file());
            if let Some(from) = found {
                if let Ok(relative) = from.strip_prefix(root) {
                    copy_file(&from, &ctx.dest_root.join(relative))?;
                }
            }
        }
        Ok(())
    }
}

pub fn all() -> Vec<Box<dyn AdditionalResources>> {
    vec![Box::new(StyleFiles), Box::new(ResourceTemplates)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::model::{Resource, StoreKind, StoreRef, Style, Workspace};
    use tempfile::TempDir;

    fn context(tmp: &TempDir) -> ResourceContext {
        ResourceContext {
            source_root: tmp.path().join("source"),
            dest_root: tmp.path().join("dest"),
        }
    }

    mod styles {
        use super::*;

        #[test]
        fn should_copy_style_definition() {
            let tmp = TempDir::new().unwrap();
            let ctx = context(&tmp);
            std::fs::create_dir_all(ctx.source_root.join("styles")).unwrap();
            std::fs::write(ctx.source_root.join("styles").join("line.sld"), "<sld/>").unwrap();

            StyleFiles
                .write(&ctx, &Style::new("line").into())
                .unwrap();

            assert_eq!(
                std::fs::read_to_string(ctx.dest_root.join("styles").join("line.sld")).unwrap(),
                "<sld/>"
            );
        }

        #[test]
        fn should_fail_on_missing_style_definition() {
            let tmp = TempDir::new().unwrap();

            let result = StyleFiles.write(&context(&tmp), &Style::new("line").into());

            assert!(matches!(result, Err(ResourceError::MissingStyleFile(_))));
        }

        #[test]
        fn should_refuse_file_names_leaving_styles_directory() {
            let tmp = TempDir::new().unwrap();
            let mut style = Style::new("line");
            style.filename = "../secrets.txt".to_owned();

            let result = StyleFiles.write(&context(&tmp), &style.into());

            assert!(matches!(result, Err(ResourceError::InvalidStyleFile(_))));
        }

        #[test]
        fn should_only_handle_styles() {
            assert!(StyleFiles.can_handle(&Style::new("line").into()));
            assert!(!StyleFiles.can_handle(&Workspace::new("topp").into()));
        }
    }

    mod templates {
        use super::*;

        #[test]
        fn should_copy_templates_found_by_lookup() {
            let tmp = TempDir::new().unwrap();
            let ctx = context(&tmp);
            let store = StoreRef::new("topp", "postgis", StoreKind::Data);
            let resource_dir = layout::resource_dir(&ctx.source_root, &store, "roads");
            let workspace_dir = layout::workspace_dir(&ctx.source_root, "topp");
            std::fs::create_dir_all(&resource_dir).unwrap();
            std::fs::write(resource_dir.join("title.ftl"), "resource title").unwrap();
            std::fs::write(workspace_dir.join("title.ftl"), "workspace title").unwrap();
            std::fs::write(workspace_dir.join("header.ftl"), "workspace header").unwrap();
            std::fs::write(resource_dir.join("notes.txt"), "not a template").unwrap();

            ResourceTemplates
                .write(&ctx, &Resource::feature_type(store.clone(), "roads").into())
                .unwrap();

            let dest_resource = layout::resource_dir(&ctx.dest_root, &store, "roads");
            let dest_workspace = layout::workspace_dir(&ctx.dest_root, "topp");
            assert_eq!(
                std::fs::read_to_string(dest_resource.join("title.ftl")).unwrap(),
                "resource title"
            );
            assert_eq!(
                std::fs::read_to_string(dest_workspace.join("header.ftl")).unwrap(),
                "workspace header"
            );
            assert!(!dest_workspace.join("title.ftl").exists());
            assert!(!dest_resource.join("notes.txt").exists());
        }

        #[test]
        fn should_not_require_templates() {
            let tmp = TempDir::new().unwrap();
            let store = StoreRef::new("topp", "postgis", StoreKind::Data);

            ResourceTemplates
                .write(&context(&tmp), &Resource::feature_type(store, "roads").into())
                .unwrap();
        }
    }
}
