//! Template driven module scaffolding.
//!
//! A [`Store`] holds named templates with `[PLACEHOLDER]` tokens. [`generate`]
//! derives the token values from a module name, renders the selected
//! templates into a [`plan::WritePlan`] and commits it below a project root.

use std::path::Path;

pub mod types;
pub mod template;
pub mod tokens;
pub mod digest;
pub mod input;
pub mod catalog;
pub mod render;
pub mod plan;
pub mod writer;
pub mod config;
pub mod error_report;
pub mod logging;
mod builtin;

pub type Map<K, V> = std::collections::BTreeMap<K, V>;
pub type Set<T> = std::collections::BTreeSet<T>;

pub use catalog::{SourceDescriptor, Store, TemplateEntry, UnknownTag};
pub use plan::PlanError;
pub use tokens::{Overrides, TokenKey, UnknownTokenKey};
pub use types::ModuleName;
pub use writer::{CommitOptions, GenerationResult, OverwritePolicy, PathOutcome};

/// One generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Module name as typed by the user.
    pub module_name: String,
    /// Placeholder values replacing the derived ones, keyed by placeholder name.
    pub overrides: Map<String, String>,
    /// Templates to render; empty selects all of them.
    pub tags: Set<String>,
    pub overwrite: OverwritePolicy,
    pub dry_run: bool,
}

impl GenerateRequest {
    pub fn new<S: Into<String>>(module_name: S) -> Self {
        GenerateRequest {
            module_name: module_name.into(),
            ..Default::default()
        }
    }

    pub fn commit_options(&self) -> CommitOptions {
        CommitOptions {
            overwrite: self.overwrite,
            dry_run: self.dry_run,
        }
    }
}

/// Request rejected before anything was written.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    UnknownTag(#[from] UnknownTag),
    #[error(transparent)]
    UnknownOverride(#[from] UnknownTokenKey),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Outcome classes surfaced to the caller, with their process exit codes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ExitStatus {
    /// Every path was written or skipped.
    Success,
    /// Some paths failed or were never attempted.
    PartialFailure,
    /// Nothing was written.
    ValidationFailure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::PartialFailure => 1,
            ExitStatus::ValidationFailure => 2,
        }
    }

    pub fn of(result: &Result<GenerationResult, GenerateError>) -> Self {
        match result {
            Ok(result) if result.is_complete() => ExitStatus::Success,
            Ok(_) => ExitStatus::PartialFailure,
            Err(_) => ExitStatus::ValidationFailure,
        }
    }
}

/// Renders the templates selected by `request` and writes them below `root`.
///
/// Validation (module name, overrides, tags, rendering, path collisions)
/// happens before the first write. Once writing starts, failures are
/// reported per path in the returned [`GenerationResult`].
pub fn generate(store: &Store, root: &Path, request: &GenerateRequest) -> Result<GenerationResult, GenerateError> {
    let overrides = Overrides::parse(&request.overrides)?;
    let entries = store.select(request.tags.iter().map(String::as_str))?;
    let plan = plan::plan(&request.module_name, &overrides, entries)?;

    tracing::info!(module = %plan.module(), root = %root.display(), writes = plan.len(), "generating module");

    Ok(writer::commit(plan, root, &request.commit_options()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;
    use tempfile::TempDir;
    use crate::types::{Tag, TemplateId};

    fn store() -> Store {
        let tags = |tags: &[&str]| -> Set<Tag> { tags.iter().map(|tag| Tag::try_from(*tag).unwrap()).collect() };
        Store::from_entries(vec![
            TemplateEntry::new(TemplateId::try_from("infos").unwrap(), tags(&["commands"]), "[MODULE_NAME] [MODULE_DESCRIPTION]\n", "[MODULE_NAME]/Infos.txt").unwrap(),
            TemplateEntry::new(TemplateId::try_from("routes").unwrap(), tags(&["routes"]), "[MODULE_NAME_KEBAB]\n", "[MODULE_NAME]/routes.txt").unwrap(),
        ]).unwrap()
    }

    #[test]
    fn overrides_and_tags() {
        let dir = TempDir::new().unwrap();
        let mut request = GenerateRequest::new("user_accounts");
        request.tags.insert("commands".to_owned());
        request.overrides.insert("MODULE_DESCRIPTION".to_owned(), "Accounts".to_owned());
        let result = generate(&store(), dir.path(), &request).unwrap();
        assert_eq!(result.written().count(), 1);
        let content = std::fs::read_to_string(dir.path().join("UserAccounts/Infos.txt")).unwrap();
        assert_eq!(content, "UserAccounts Accounts\n");
        assert!(!dir.path().join("UserAccounts/routes.txt").exists());
    }

    #[test]
    fn unknown_override_is_validation_failure() {
        let dir = TempDir::new().unwrap();
        let mut request = GenerateRequest::new("billing");
        request.overrides.insert("MODULE_COLOUR".to_owned(), "red".to_owned());
        let result = generate(&store(), dir.path(), &request);
        assert!(matches!(result, Err(GenerateError::UnknownOverride(ref key)) if key.0 == "MODULE_COLOUR"));
        assert_eq!(ExitStatus::of(&result), ExitStatus::ValidationFailure);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unknown_override_names_the_key() {
        let error = GenerateError::from(UnknownTokenKey("MODULE_COLOUR".to_owned()));
        assert!(error.to_string().contains("MODULE_COLOUR"));
    }

    #[test]
    fn unknown_tag_is_validation_failure() {
        let dir = TempDir::new().unwrap();
        let mut request = GenerateRequest::new("billing");
        request.tags.insert("seeders".to_owned());
        assert!(matches!(generate(&store(), dir.path(), &request), Err(GenerateError::UnknownTag(_))));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::PartialFailure.code(), 1);
        assert_eq!(ExitStatus::ValidationFailure.code(), 2);
    }
}
