//! Raw TOML input: template catalog manifests and the configuration file.

use std::path::{Path, PathBuf};
use serde_derive::Deserialize;
use indexmap::IndexMap as OrderedHashMap;
use crate::types::{Tag, TemplateId};
use crate::writer::OverwritePolicy;

use super::{Map, Set};

/// Name of the manifest inside a catalog directory.
pub const CATALOG_MANIFEST: &str = "catalog.toml";

/// `catalog.toml`
///
/// ```toml
/// [templates.infos]
/// source = "Console/Commands/Infos.php"
/// path = "app/Modules/[MODULE_NAME]/Console/Commands/Infos.php"
/// tags = ["module-commands"]
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub templates: OrderedHashMap<TemplateId, TemplateDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateDecl {
    /// Template file, relative to the catalog directory.
    pub source: PathBuf,
    /// Output path pattern; taken from the template's `// Path:` line when absent.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub tags: Set<Tag>,
    #[serde(default)]
    pub overwrite: Option<OverwritePolicy>,
}

/// `modcrafter.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Catalog directory, relative to the file's directory.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub overwrite: Option<OverwritePolicy>,
    #[serde(default)]
    pub tags: Set<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub overrides: Map<String, String>,
}

#[derive(Debug, thiserror::Error)]
enum LoadTomlErrorSource {
    #[error("Failed to read")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to load Toml file {path}")]
pub struct LoadTomlError {
    path: PathBuf,
    #[source]
    inner: LoadTomlErrorSource,
}

impl LoadTomlError {
    fn with_path<E: Into<LoadTomlErrorSource>, P: Into<PathBuf>>(path: P) -> impl FnOnce(E) -> Self {
        |error| LoadTomlError {
            path: path.into(),
            inner: error.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_not_found(&self) -> bool {
        match &self.inner {
            LoadTomlErrorSource::Read(error) => error.kind() == std::io::ErrorKind::NotFound,
            LoadTomlErrorSource::Parse(_) => false,
        }
    }

    /// Byte range of a parse error, if the parser reported one.
    pub fn parse_span(&self, source: &str) -> Option<std::ops::Range<usize>> {
        match &self.inner {
            LoadTomlErrorSource::Parse(error) => {
                let (line, col) = error.line_col()?;
                let line_start = source.split_inclusive('\n').take(line).map(str::len).sum::<usize>();
                let start = (line_start + col).min(source.len());
                Some(start..(start + 1).min(source.len()))
            },
            LoadTomlErrorSource::Read(_) => None,
        }
    }
}

pub fn load_toml<T: for<'a> serde::Deserialize<'a>, P: AsRef<Path>>(file: P) -> Result<T, LoadTomlError> {
    let file = file.as_ref();
    let contents = std::fs::read(file).map_err(LoadTomlError::with_path(file))?;
    toml::from_slice(&contents)
        .map_err(LoadTomlErrorSource::Parse)
        .map_err(LoadTomlError::with_path(file))
}

#[cfg(test)]
mod tests {
    use super::{Catalog, ConfigFile};
    use crate::writer::OverwritePolicy;

    #[test]
    fn catalog_keeps_declaration_order() {
        let catalog: Catalog = toml::from_str(r#"
            [templates.seeders]
            source = "Seeders.php"
            tags = ["module-commands"]

            [templates.infos]
            source = "Infos.php"
            path = "app/[MODULE_NAME]/Infos.php"
            overwrite = "if-identical"
        "#).unwrap();

        let ids = catalog.templates.keys().map(|id| id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["seeders", "infos"]);
        assert_eq!(catalog.templates["infos"].overwrite, Some(OverwritePolicy::IfIdentical));
        assert!(catalog.templates["infos"].tags.is_empty());
    }

    #[test]
    fn catalog_rejects_invalid_tag() {
        let result = toml::from_str::<Catalog>(r#"
            [templates.infos]
            source = "Infos.php"
            tags = ["Module Commands"]
        "#);
        assert!(result.is_err());
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(toml::from_str::<ConfigFile>("colour = true").is_err());
    }

    #[test]
    fn config_reads_overrides() {
        let config: ConfigFile = toml::from_str(r#"
            overwrite = "always"
            tags = ["module-commands"]

            [overrides]
            MODULE_DESCRIPTION = "Invoices and payments"
        "#).unwrap();
        assert_eq!(config.overwrite, Some(OverwritePolicy::Always));
        assert_eq!(config.overrides["MODULE_DESCRIPTION"], "Invoices and payments");
    }
}
