//! Layered settings: built-in defaults, `modcrafter.toml`, command line.

use std::path::{Path, PathBuf};
use crate::catalog::SourceDescriptor;
use crate::input::{self, ConfigFile, LoadTomlError};
use crate::writer::OverwritePolicy;
use crate::{GenerateRequest, Map, Set};

/// Looked up in the project root unless a file is given explicitly.
pub const CONFIG_FILE_NAME: &str = "modcrafter.toml";

/// A configuration file together with the directory relative paths in it are resolved against.
#[derive(Debug)]
pub struct ConfigSource {
    pub dir: PathBuf,
    pub file: ConfigFile,
}

/// Loads `explicit`, or `modcrafter.toml` in `root` if it exists.
///
/// A missing default file is not an error, a missing explicit one is.
pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Option<ConfigSource>, LoadTomlError> {
    let path = match explicit {
        Some(path) => path.to_owned(),
        None => root.join(CONFIG_FILE_NAME),
    };

    match input::load_toml::<ConfigFile, _>(&path) {
        Ok(file) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
                _ => PathBuf::from("."),
            };
            Ok(Some(ConfigSource { dir, file }))
        },
        Err(error) if explicit.is_none() && error.is_not_found() => Ok(None),
        Err(error) => Err(error),
    }
}

/// Values given on the command line. Unset options fall back to the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub catalog: Option<PathBuf>,
    pub overwrite: Option<OverwritePolicy>,
    /// Replace the tags from the file when non-empty.
    pub tags: Vec<String>,
    /// `Some(false)` turns off a `dry_run = true` from the file.
    pub dry_run: Option<bool>,
    /// Merged over the file's `[overrides]`, later pairs win.
    pub overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub source: SourceDescriptor,
    pub overwrite: OverwritePolicy,
    pub tags: Set<String>,
    pub dry_run: bool,
    pub overrides: Map<String, String>,
}

impl Settings {
    pub fn resolve(root: PathBuf, config: Option<ConfigSource>, cli: CliOverrides) -> Self {
        let (dir, file) = match config {
            Some(ConfigSource { dir, file }) => (Some(dir), file),
            None => (None, ConfigFile::default()),
        };

        let source = match (cli.catalog, file.catalog) {
            (Some(catalog), _) => SourceDescriptor::Directory(catalog),
            (None, Some(catalog)) => match dir {
                Some(dir) => SourceDescriptor::Directory(dir.join(catalog)),
                None => SourceDescriptor::Directory(catalog),
            },
            (None, None) => SourceDescriptor::Builtin,
        };

        let tags = if cli.tags.is_empty() {
            file.tags
        } else {
            cli.tags.into_iter().collect()
        };

        let mut overrides = file.overrides;
        overrides.extend(cli.overrides);

        Settings {
            root,
            source,
            overwrite: cli.overwrite.or(file.overwrite).unwrap_or_default(),
            tags,
            dry_run: cli.dry_run.unwrap_or(file.dry_run),
            overrides,
        }
    }

    pub fn request<S: Into<String>>(&self, module_name: S) -> GenerateRequest {
        GenerateRequest {
            module_name: module_name.into(),
            overrides: self.overrides.clone(),
            tags: self.tags.clone(),
            overwrite: self.overwrite,
            dry_run: self.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_default_file_is_fine() {
        let dir = TempDir::new().unwrap();
        assert!(discover(dir.path(), None).unwrap().is_none());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let error = discover(dir.path(), Some(&dir.path().join("other.toml"))).unwrap_err();
        assert!(error.is_not_found());
    }

    #[test]
    fn cli_wins_over_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"
            catalog = "templates"
            overwrite = "always"
            tags = ["module-commands"]

            [overrides]
            MODULE_DESCRIPTION = "From file"
            MODULE_NAME_KEBAB = "billing"
        "#).unwrap();

        let config = discover(dir.path(), None).unwrap();
        let cli = CliOverrides {
            overwrite: Some(OverwritePolicy::Skip),
            overrides: vec![("MODULE_DESCRIPTION".to_owned(), "From flag".to_owned())],
            ..Default::default()
        };
        let settings = Settings::resolve(dir.path().to_owned(), config, cli);

        assert_eq!(settings.source, SourceDescriptor::Directory(dir.path().join("templates")));
        assert_eq!(settings.overwrite, OverwritePolicy::Skip);
        assert_eq!(settings.tags.iter().collect::<Vec<_>>(), ["module-commands"]);
        assert_eq!(settings.overrides["MODULE_DESCRIPTION"], "From flag");
        assert_eq!(settings.overrides["MODULE_NAME_KEBAB"], "billing");
    }

    #[test]
    fn hyphenated_policy_in_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "overwrite = \"if-identical\"").unwrap();
        let config = discover(dir.path(), None).unwrap();
        let settings = Settings::resolve(dir.path().to_owned(), config, CliOverrides::default());
        assert_eq!(settings.overwrite, OverwritePolicy::IfIdentical);
    }

    #[test]
    fn cli_can_turn_off_dry_run() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "dry_run = true").unwrap();

        let settings = Settings::resolve(dir.path().to_owned(), discover(dir.path(), None).unwrap(), CliOverrides::default());
        assert!(settings.dry_run);

        let cli = CliOverrides { dry_run: Some(false), ..Default::default() };
        let settings = Settings::resolve(dir.path().to_owned(), discover(dir.path(), None).unwrap(), cli);
        assert!(!settings.dry_run);
    }

    #[test]
    fn defaults_without_file() {
        let settings = Settings::resolve(PathBuf::from("."), None, CliOverrides::default());
        assert_eq!(settings.source, SourceDescriptor::Builtin);
        assert_eq!(settings.overwrite, OverwritePolicy::Never);
        assert!(settings.tags.is_empty());
        assert!(!settings.dry_run);

        let request = settings.request("billing");
        assert_eq!(request.module_name, "billing");
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "overwrite = \"sometimes\"").unwrap();
        let error = discover(dir.path(), None).unwrap_err();
        assert!(!error.is_not_found());
        assert_eq!(error.path(), dir.path().join(CONFIG_FILE_NAME));
    }
}
