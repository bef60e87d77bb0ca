//! Template store.
//!
//! Templates are loaded once, validated against the known placeholder keys and
//! then only read. A [`Store`] can be shared between threads handling
//! independent generation requests.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use either::Either;
use indexmap::IndexMap;
use crate::digest::ContentDigest;
use crate::input::{self, LoadTomlError, CATALOG_MANIFEST};
use crate::tokens::TokenKey;
use crate::types::{Tag, TemplateId};
use crate::writer::OverwritePolicy;
use crate::Set;

const PATH_MARKERS: &[&str] = &["// Path:", "# Path:"];

/// Where to load templates from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SourceDescriptor {
    /// Templates bundled with the crate.
    Builtin,
    /// Directory containing `catalog.toml`.
    Directory(PathBuf),
}

/// Part of a template a placeholder was found in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TemplateField {
    Body,
    OutputPath,
}

impl fmt::Display for TemplateField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TemplateField::Body => write!(f, "body"),
            TemplateField::OutputPath => write!(f, "output path"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("template {template} uses unknown placeholder [{key}] in its {field}")]
pub struct UnknownPlaceholder {
    pub template: TemplateId,
    pub key: String,
    pub field: TemplateField,
    /// Byte range of the bracketed placeholder within `text`.
    pub span: Range<usize>,
    /// The body or output path pattern containing the placeholder.
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load template catalog")]
    Manifest(#[from] LoadTomlError),
    #[error("failed to read template {id} from {}", path.display())]
    ReadTemplate {
        id: TemplateId,
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error(transparent)]
    UnknownPlaceholder(#[from] UnknownPlaceholder),
    #[error("failed to parse the bundled template catalog")]
    BundledManifest(#[source] toml::de::Error),
    #[error("template {0} is declared more than once")]
    DuplicateTemplate(TemplateId),
    #[error("template {0} has no output path, set `path` in the manifest or end the template with a `// Path:` line")]
    MissingOutputPath(TemplateId),
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("no template is tagged {tag}")]
pub struct UnknownTag {
    pub tag: String,
}

#[derive(Debug, Clone)]
pub struct TemplateEntry {
    id: TemplateId,
    tags: Set<Tag>,
    body: String,
    output_path: String,
    overwrite: Option<OverwritePolicy>,
    digest: ContentDigest,
}

fn check_placeholders(id: &TemplateId, field: TemplateField, text: &str) -> Result<(), UnknownPlaceholder> {
    for (key, pos) in crate::template::parse(text).vars() {
        if TokenKey::from_key(key).is_none() {
            return Err(UnknownPlaceholder {
                template: id.clone(),
                key: key.to_owned(),
                field,
                span: pos..(pos + key.len() + 2),
                text: text.to_owned(),
            });
        }
    }
    Ok(())
}

/// Splits a trailing `// Path: <pattern>` line off a template body.
///
/// Returns the body without the marker line (ending with a single newline) and the pattern.
pub fn split_path_marker(body: &str) -> Option<(String, &str)> {
    let trimmed = body.trim_end();
    let line_start = trimmed.rfind('\n').map_or(0, |pos| pos + 1);
    let last_line = trimmed[line_start..].trim_start();
    let pattern = PATH_MARKERS
        .iter()
        .find_map(|marker| last_line.strip_prefix(marker))?
        .trim();
    if pattern.is_empty() {
        return None;
    }

    let mut rest = trimmed[..line_start].trim_end().to_owned();
    rest.push('\n');
    Some((rest, pattern))
}

impl TemplateEntry {
    /// Creates an entry, failing if the body or path pattern uses an unknown placeholder.
    pub fn new<B: Into<String>, P: Into<String>>(id: TemplateId, tags: Set<Tag>, body: B, output_path: P) -> Result<Self, UnknownPlaceholder> {
        let body = body.into();
        let output_path = output_path.into();
        check_placeholders(&id, TemplateField::Body, &body)?;
        check_placeholders(&id, TemplateField::OutputPath, &output_path)?;
        let digest = ContentDigest::of(&body);

        Ok(TemplateEntry {
            id,
            tags,
            body,
            output_path,
            overwrite: None,
            digest,
        })
    }

    /// Creates an entry whose output path comes from the body's trailing path marker.
    pub fn from_marked_body(id: TemplateId, tags: Set<Tag>, body: &str) -> Result<Self, LoadError> {
        match split_path_marker(body) {
            Some((body, pattern)) => Ok(TemplateEntry::new(id, tags, body, pattern)?),
            None => Err(LoadError::MissingOutputPath(id)),
        }
    }

    pub(crate) fn from_decl(id: TemplateId, decl: input::TemplateDecl, body: String) -> Result<Self, LoadError> {
        let entry = match decl.path {
            Some(pattern) => TemplateEntry::new(id, decl.tags, body, pattern)?,
            None => TemplateEntry::from_marked_body(id, decl.tags, &body)?,
        };
        Ok(match decl.overwrite {
            Some(policy) => entry.with_overwrite(policy),
            None => entry,
        })
    }

    pub fn with_overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = Some(policy);
        self
    }

    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn tags(&self) -> &Set<Tag> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// Policy overriding the one requested for the whole commit.
    pub fn overwrite(&self) -> Option<OverwritePolicy> {
        self.overwrite
    }

    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }
}

#[derive(Debug, Clone, Default)]
pub struct Store {
    entries: IndexMap<TemplateId, TemplateEntry>,
}

impl Store {
    pub fn load(source: &SourceDescriptor) -> Result<Self, LoadError> {
        match source {
            SourceDescriptor::Builtin => Store::from_entries(crate::builtin::entries()?),
            SourceDescriptor::Directory(dir) => Store::load_dir(dir),
        }
    }

    fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        let manifest = input::load_toml::<input::Catalog, _>(dir.join(CATALOG_MANIFEST))?;

        let entries = manifest.templates
            .into_iter()
            .map(|(id, decl)| {
                let path = dir.join(&decl.source);
                let body = match std::fs::read_to_string(&path) {
                    Ok(body) => body,
                    Err(error) => return Err(LoadError::ReadTemplate { id, path, error }),
                };
                TemplateEntry::from_decl(id, decl, body)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let store = Store::from_entries(entries)?;
        tracing::debug!(dir = %dir.display(), templates = store.len(), "loaded template catalog");
        Ok(store)
    }

    pub fn from_entries<I: IntoIterator<Item=TemplateEntry>>(entries: I) -> Result<Self, LoadError> {
        let mut map = IndexMap::new();
        for entry in entries {
            if map.contains_key(&entry.id) {
                return Err(LoadError::DuplicateTemplate(entry.id));
            }
            map.insert(entry.id.clone(), entry);
        }
        Ok(Store { entries: map })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TemplateEntry> {
        self.entries.get(id)
    }

    /// Entries in declaration order, optionally only those carrying `tag`.
    pub fn list_entries<'a>(&'a self, tag: Option<&'a str>) -> impl 'a + Iterator<Item=&'a TemplateEntry> {
        match tag {
            None => Either::Left(self.entries.values()),
            Some(tag) => Either::Right(self.entries.values().filter(move |entry| entry.has_tag(tag))),
        }
    }

    /// Entries carrying any of `tags`, or every entry if `tags` is empty.
    ///
    /// Each requested tag must be carried by at least one entry.
    pub fn select<'t, I: IntoIterator<Item=&'t str>>(&self, tags: I) -> Result<Vec<&TemplateEntry>, UnknownTag> {
        let tags = tags.into_iter().collect::<Vec<_>>();
        if tags.is_empty() {
            return Ok(self.list_entries(None).collect());
        }

        for tag in &tags {
            if self.list_entries(Some(*tag)).next().is_none() {
                return Err(UnknownTag { tag: (*tag).to_owned() });
            }
        }

        Ok(self.entries
            .values()
            .filter(|entry| tags.iter().any(|tag| entry.has_tag(tag)))
            .collect())
    }

    pub fn tags(&self) -> Set<&Tag> {
        self.entries.values().flat_map(|entry| entry.tags.iter()).collect()
    }

    pub fn find_by_digest<'a>(&'a self, digest: &'a ContentDigest) -> impl 'a + Iterator<Item=&'a TemplateEntry> {
        self.entries.values().filter(move |entry| entry.digest == *digest)
    }
}
