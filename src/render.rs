//! Substitution of placeholder values into a single template.

use std::path::{Component, Path, PathBuf};
use crate::catalog::{TemplateEntry, TemplateField};
use crate::template::{self, Query};
use crate::types::TemplateId;

/// A template with every placeholder replaced.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Rendered {
    /// Destination relative to the project root.
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("template {template} needs a value for [{key}] in its {field}")]
    MissingToken {
        template: TemplateId,
        key: String,
        field: TemplateField,
    },
    #[error("template {template} renders to {path:?} which is not a relative path inside the project")]
    InvalidDestination {
        template: TemplateId,
        path: String,
    },
}

fn is_contained(path: &Path) -> bool {
    path.components().next().is_some() && path.components().all(|component| matches!(component, Component::Normal(_)))
}

/// Renders body and output path of `entry`.
///
/// Substitution is a single pass; values are inserted verbatim. The rendered
/// path must stay inside the project root: no absolute paths, no `..`.
pub fn render<V: Query>(entry: &TemplateEntry, vars: V) -> Result<Rendered, RenderError> {
    let missing = |field| move |error: template::MissingVariable| RenderError::MissingToken {
        template: entry.id().clone(),
        key: error.key,
        field,
    };

    let path = template::expand_to_cow(entry.output_path(), &vars).map_err(missing(TemplateField::OutputPath))?;
    let content = template::expand_to_cow(entry.body(), &vars).map_err(missing(TemplateField::Body))?;

    let path = PathBuf::from(path.into_owned());
    if !is_contained(&path) {
        return Err(RenderError::InvalidDestination {
            template: entry.id().clone(),
            path: path.to_string_lossy().into_owned(),
        });
    }

    tracing::trace!(template = %entry.id(), path = %path.display(), "rendered template");

    Ok(Rendered {
        path,
        content: content.into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::{render, RenderError};
    use crate::catalog::{TemplateEntry, TemplateField};
    use crate::tokens::{resolve, Overrides};
    use crate::types::{ModuleName, TemplateId};
    use std::collections::BTreeMap;
    use std::convert::TryFrom;
    use std::path::Path;

    fn entry(body: &str, path: &str) -> TemplateEntry {
        TemplateEntry::new(TemplateId::try_from("infos").unwrap(), Default::default(), body, path).unwrap()
    }

    fn tokens(name: &str) -> crate::tokens::TokenMap {
        resolve(&ModuleName::try_from(name).unwrap(), &Overrides::new())
    }

    #[test]
    fn renders_body_and_path() {
        let entry = entry("protected $signature = '[MODULE_NAME_TO_LOWER]:info';", "app/Modules/[MODULE_NAME]/Infos.php");
        let rendered = render(&entry, tokens("Billing")).unwrap();
        assert_eq!(rendered.path, Path::new("app/Modules/Billing/Infos.php"));
        assert_eq!(rendered.content, "protected $signature = 'billing:info';");
    }

    #[test]
    fn missing_token_in_stale_map() {
        let mut partial = BTreeMap::new();
        partial.insert("MODULE_NAME", "Billing");
        let error = render(&entry("[MODULE_DESCRIPTION]", "[MODULE_NAME].php"), &partial).unwrap_err();
        match error {
            RenderError::MissingToken { key, field, .. } => {
                assert_eq!(key, "MODULE_DESCRIPTION");
                assert_eq!(field, TemplateField::Body);
            },
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn description_cannot_escape_root() {
        let mut vars = BTreeMap::new();
        vars.insert("MODULE_DESCRIPTION", "../../etc");
        let error = render(&entry("", "app/[MODULE_DESCRIPTION]/x"), &vars).unwrap_err();
        assert!(matches!(error, RenderError::InvalidDestination { .. }));
    }

    #[test]
    fn absolute_and_empty_paths_rejected() {
        let vars = BTreeMap::<&str, &str>::new();
        assert!(render(&entry("", "/etc/passwd"), &vars).is_err());
        assert!(render(&entry("", ""), &vars).is_err());
        assert!(render(&entry("", "./app/x"), &vars).is_err());
    }
}
