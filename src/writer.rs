//! Applies a [`WritePlan`] to a directory tree.
//!
//! Each destination is written through a temporary file in the same directory
//! which is renamed over the destination, so a reader never observes a
//! partially written file. The plan as a whole is *not* transactional: if a
//! path fails, paths written before it stay in place and later paths are
//! still attempted. The returned [`GenerationResult`] lists exactly what
//! happened to every path; rolling back is up to the caller.
//!
//! Concurrent commits into overlapping directories are not coordinated here.
//! Callers running several requests at once must serialize them per project
//! root.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use serde_derive::Deserialize;
use crate::digest::ContentDigest;
use crate::plan::{PlannedWrite, WritePlan};
use crate::types::TemplateId;

/// What to do when a destination already exists.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Identical files are skipped, different ones are a conflict.
    Never,
    /// Like `Never`, but files differing only in trailing whitespace or line
    /// endings are replaced.
    #[serde(alias = "if_identical")]
    IfIdentical,
    /// Always replace.
    Always,
    /// Leave any existing file alone.
    Skip,
}

impl Default for OverwritePolicy {
    fn default() -> Self {
        OverwritePolicy::Never
    }
}

impl OverwritePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            OverwritePolicy::Never => "never",
            OverwritePolicy::IfIdentical => "if-identical",
            OverwritePolicy::Always => "always",
            OverwritePolicy::Skip => "skip",
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown overwrite policy {0:?}, expected one of never, if-identical, always, skip")]
pub struct UnknownPolicy(String);

impl std::str::FromStr for OverwritePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(OverwritePolicy::Never),
            "if-identical" | "if_identical" => Ok(OverwritePolicy::IfIdentical),
            "always" => Ok(OverwritePolicy::Always),
            "skip" => Ok(OverwritePolicy::Skip),
            _ => Err(UnknownPolicy(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
    /// Used for templates that don't specify their own policy.
    pub overwrite: OverwritePolicy,
    /// Classify every path without touching the file system.
    pub dry_run: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("{} already exists with different content", path.display())]
    Conflict { path: PathBuf },
    #[error("failed to {op} {}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        error: io::Error,
    },
}

#[derive(Debug)]
pub enum PathOutcome {
    Written,
    SkippedIdentical,
    SkippedExisting,
    Failed(WriteError),
}

impl PathOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PathOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct PathReport {
    /// Destination relative to the project root.
    pub destination: PathBuf,
    pub template: TemplateId,
    pub outcome: PathOutcome,
}

/// Outcome of a commit.
///
/// Partial success is possible: check [`GenerationResult::failed`] and
/// [`GenerationResult::unapplied`] before assuming the module is complete.
#[derive(Debug)]
pub struct GenerationResult {
    reports: Vec<PathReport>,
    unapplied: Vec<PathBuf>,
    dry_run: bool,
}

impl GenerationResult {
    pub fn reports(&self) -> &[PathReport] {
        &self.reports
    }

    fn with_outcome<'a>(&'a self, pred: fn(&PathOutcome) -> bool) -> impl 'a + Iterator<Item=&'a Path> {
        self.reports
            .iter()
            .filter(move |report| pred(&report.outcome))
            .map(|report| &*report.destination)
    }

    pub fn written(&self) -> impl '_ + Iterator<Item=&Path> {
        self.with_outcome(|outcome| matches!(outcome, PathOutcome::Written))
    }

    pub fn skipped_identical(&self) -> impl '_ + Iterator<Item=&Path> {
        self.with_outcome(|outcome| matches!(outcome, PathOutcome::SkippedIdentical))
    }

    pub fn skipped_existing(&self) -> impl '_ + Iterator<Item=&Path> {
        self.with_outcome(|outcome| matches!(outcome, PathOutcome::SkippedExisting))
    }

    pub fn failed(&self) -> impl '_ + Iterator<Item=(&Path, &WriteError)> {
        self.reports.iter().filter_map(|report| match &report.outcome {
            PathOutcome::Failed(error) => Some((&*report.destination, error)),
            _ => None,
        })
    }

    /// Destinations never attempted because the commit was abandoned.
    pub fn unapplied(&self) -> &[PathBuf] {
        &self.unapplied
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// True if every path was written or skipped, none failed and none was left unapplied.
    pub fn is_complete(&self) -> bool {
        self.unapplied.is_empty() && !self.reports.iter().any(|report| report.outcome.is_failed())
    }
}

/// Strips trailing whitespace from every line and trailing blank lines, unifying line endings.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    let len = out.trim_end().len();
    out.truncate(len);
    out
}

enum Decision {
    Write,
    Keep(PathOutcome),
}

fn decide(policy: OverwritePolicy, existing: Option<&[u8]>, write: &PlannedWrite, path: &Path) -> Decision {
    let existing = match existing {
        None => return Decision::Write,
        Some(existing) => existing,
    };

    if policy == OverwritePolicy::Always {
        return Decision::Write;
    }
    if ContentDigest::of(existing) == write.digest {
        return Decision::Keep(PathOutcome::SkippedIdentical);
    }

    match policy {
        OverwritePolicy::Skip => Decision::Keep(PathOutcome::SkippedExisting),
        OverwritePolicy::IfIdentical => {
            let equivalent = std::str::from_utf8(existing)
                .map(|existing| normalize(existing) == normalize(&write.content))
                .unwrap_or(false);
            if equivalent {
                Decision::Write
            } else {
                Decision::Keep(PathOutcome::Failed(WriteError::Conflict { path: path.to_owned() }))
            }
        },
        OverwritePolicy::Never | OverwritePolicy::Always => Decision::Keep(PathOutcome::Failed(WriteError::Conflict { path: path.to_owned() })),
    }
}

fn io_error(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> WriteError {
    let path = path.to_owned();
    move |error| WriteError::Io { op, path, error }
}

#[cfg(unix)]
fn new_file_permissions(existing: Option<fs::Permissions>) -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(existing.unwrap_or_else(|| fs::Permissions::from_mode(0o644)))
}

#[cfg(not(unix))]
fn new_file_permissions(existing: Option<fs::Permissions>) -> Option<fs::Permissions> {
    existing
}

/// Writes `content` to `path` via a temporary sibling file and a rename.
///
/// The temporary file is removed when dropped, so an error at any step leaves
/// nothing behind but the untouched destination.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), WriteError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_error("create directory", parent))?;

    let permissions = new_file_permissions(fs::metadata(path).ok().map(|metadata| metadata.permissions()));

    let mut file = tempfile::Builder::new()
        .prefix(".modcrafter-")
        .tempfile_in(parent)
        .map_err(io_error("create temporary file in", parent))?;
    file.write_all(content).map_err(io_error("write temporary file for", path))?;
    if let Some(permissions) = permissions {
        file.as_file().set_permissions(permissions).map_err(io_error("set permissions of temporary file for", path))?;
    }
    file.as_file().sync_all().map_err(io_error("sync temporary file for", path))?;
    file.persist(path).map_err(|error| error.error).map_err(io_error("rename temporary file to", path))?;
    Ok(())
}

fn apply(root: &Path, write: &PlannedWrite, options: &CommitOptions) -> PathOutcome {
    let path = root.join(&write.destination);
    let policy = write.overwrite.unwrap_or(options.overwrite);

    let existing = match fs::read(&path) {
        Ok(existing) => Some(existing),
        Err(error) if error.kind() == io::ErrorKind::NotFound => None,
        Err(error) => return PathOutcome::Failed(WriteError::Io { op: "read existing file", path, error }),
    };

    match decide(policy, existing.as_deref(), write, &path) {
        Decision::Keep(outcome) => outcome,
        Decision::Write if options.dry_run => PathOutcome::Written,
        Decision::Write => match write_atomic(&path, write.content.as_bytes()) {
            Ok(()) => PathOutcome::Written,
            Err(error) => PathOutcome::Failed(error),
        },
    }
}

/// A commit in progress, applying one path per [`Commit::step`].
///
/// Dropping out between steps is allowed: [`Commit::abandon`] reports the
/// remaining destinations as unapplied. A single path is never left half
/// written.
pub struct Commit<'a> {
    root: &'a Path,
    options: CommitOptions,
    pending: std::vec::IntoIter<PlannedWrite>,
    reports: Vec<PathReport>,
}

impl<'a> Commit<'a> {
    pub fn new(plan: WritePlan, root: &'a Path, options: CommitOptions) -> Self {
        let pending = plan.into_writes();
        Commit {
            root,
            options,
            reports: Vec::with_capacity(pending.len()),
            pending: pending.into_iter(),
        }
    }

    /// Destinations not yet attempted.
    pub fn pending(&self) -> impl '_ + Iterator<Item=&Path> {
        self.pending.as_slice().iter().map(|write| &*write.destination)
    }

    /// Applies the next write, returning its report, or `None` when done.
    pub fn step(&mut self) -> Option<&PathReport> {
        let write = self.pending.next()?;
        let outcome = apply(self.root, &write, &self.options);

        match &outcome {
            PathOutcome::Failed(error) => tracing::warn!(path = %write.destination.display(), template = %write.template, %error, "failed to write"),
            outcome => tracing::debug!(path = %write.destination.display(), template = %write.template, ?outcome, dry_run = self.options.dry_run, "processed"),
        }

        self.reports.push(PathReport {
            destination: write.destination,
            template: write.template,
            outcome,
        });
        self.reports.last()
    }

    /// Applies every remaining write.
    pub fn finish(mut self) -> GenerationResult {
        while self.step().is_some() {}
        self.abandon()
    }

    /// Stops here; remaining writes are reported as unapplied.
    pub fn abandon(self) -> GenerationResult {
        let unapplied = self.pending.map(|write| write.destination).collect::<Vec<_>>();
        let result = GenerationResult {
            reports: self.reports,
            unapplied,
            dry_run: self.options.dry_run,
        };
        tracing::info!(
            written = result.written().count(),
            identical = result.skipped_identical().count(),
            existing = result.skipped_existing().count(),
            failed = result.failed().count(),
            unapplied = result.unapplied().len(),
            dry_run = result.dry_run,
            "commit finished"
        );
        result
    }
}

/// Applies every write in `plan` below `root`.
pub fn commit(plan: WritePlan, root: &Path, options: &CommitOptions) -> GenerationResult {
    Commit::new(plan, root, *options).finish()
}
