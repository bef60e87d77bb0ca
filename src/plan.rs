//! Builds the list of writes for one generation request.
//!
//! Planning renders every template up front and checks the results against
//! each other. Nothing touches the file system until the whole plan is known
//! to be valid.

use std::convert::TryFrom;
use std::path::{Path, PathBuf};
use crate::catalog::TemplateEntry;
use crate::digest::ContentDigest;
use crate::render::{self, RenderError};
use crate::tokens::{self, Overrides};
use crate::types::{InvalidIdentifier, ModuleName, TemplateId};
use crate::writer::OverwritePolicy;
use crate::Map;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PlannedWrite {
    /// Relative to the project root.
    pub destination: PathBuf,
    pub content: String,
    /// Policy requested by the template itself.
    pub overwrite: Option<OverwritePolicy>,
    pub template: TemplateId,
    pub digest: ContentDigest,
}

/// Writes ordered by destination path.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WritePlan {
    module: ModuleName,
    writes: Vec<PlannedWrite>,
}

impl WritePlan {
    pub fn module(&self) -> &ModuleName {
        &self.module
    }

    pub fn writes(&self) -> &[PlannedWrite] {
        &self.writes
    }

    pub fn destinations(&self) -> impl '_ + Iterator<Item=&Path> {
        self.writes.iter().map(|write| &*write.destination)
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<PlannedWrite> {
        self.writes
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("templates {first} and {second} both write {}", path.display())]
    PathCollision {
        path: PathBuf,
        first: TemplateId,
        second: TemplateId,
    },
    #[error("template {file_template} writes the file {} which template {nested_template} needs as a directory for {}", file.display(), nested.display())]
    FileAsDirectory {
        file: PathBuf,
        file_template: TemplateId,
        nested: PathBuf,
        nested_template: TemplateId,
    },
}

/// Fails if a destination lies below another destination, which would have to be both file and directory.
fn check_nesting(writes: &Map<PathBuf, PlannedWrite>) -> Result<(), PlanError> {
    for (path, write) in writes {
        if let Some(file) = path.ancestors().skip(1).find_map(|ancestor| writes.get(ancestor)) {
            return Err(PlanError::FileAsDirectory {
                file: file.destination.clone(),
                file_template: file.template.clone(),
                nested: path.clone(),
                nested_template: write.template.clone(),
            });
        }
    }
    Ok(())
}

/// Renders `entries` for `module_name` into a write plan.
///
/// Fails without side effects on an invalid name, a rendering error, two
/// templates producing the same destination or one destination nested below
/// another.
pub fn plan<'a, I>(module_name: &str, overrides: &Overrides, entries: I) -> Result<WritePlan, PlanError> where I: IntoIterator<Item=&'a TemplateEntry> {
    let module = ModuleName::try_from(module_name)?;
    let tokens = tokens::resolve(&module, overrides);

    let mut writes = Map::<PathBuf, PlannedWrite>::new();
    for entry in entries {
        let rendered = render::render(entry, &tokens)?;
        match writes.get(&rendered.path) {
            Some(existing) => {
                return Err(PlanError::PathCollision {
                    path: rendered.path,
                    first: existing.template.clone(),
                    second: entry.id().clone(),
                });
            },
            None => {
                let write = PlannedWrite {
                    destination: rendered.path.clone(),
                    digest: ContentDigest::of(&rendered.content),
                    content: rendered.content,
                    overwrite: entry.overwrite(),
                    template: entry.id().clone(),
                };
                writes.insert(rendered.path, write);
            },
        }
    }

    check_nesting(&writes)?;

    tracing::debug!(module = %module, writes = writes.len(), "planned generation");

    Ok(WritePlan {
        module,
        writes: writes.into_iter().map(|(_, write)| write).collect(),
    })
}
