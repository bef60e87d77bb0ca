//! Templates compiled into the crate.
//!
//! The same files form a regular catalog directory under
//! `templates/laravel/module`, so they can be copied and customized.

use std::io;
use crate::catalog::{LoadError, TemplateEntry};
use crate::input::Catalog;

const CATALOG: &str = include_str!("../templates/laravel/module/catalog.toml");

static SOURCES: &[(&str, &str)] = &[
    ("Console/Commands/Infos.php", include_str!("../templates/laravel/module/Console/Commands/Infos.php")),
    ("Console/Commands/Migrations.php", include_str!("../templates/laravel/module/Console/Commands/Migrations.php")),
    ("Console/Commands/Seeders.php", include_str!("../templates/laravel/module/Console/Commands/Seeders.php")),
];

fn source(path: &std::path::Path) -> Option<&'static str> {
    SOURCES
        .iter()
        .find(|(name, _)| std::path::Path::new(name) == path)
        .map(|(_, body)| *body)
}

pub(crate) fn entries() -> Result<Vec<TemplateEntry>, LoadError> {
    let catalog = toml::from_str::<Catalog>(CATALOG).map_err(LoadError::BundledManifest)?;

    catalog.templates
        .into_iter()
        .map(|(id, decl)| match source(&decl.source) {
            Some(body) => TemplateEntry::from_decl(id, decl, body.to_owned()),
            None => Err(LoadError::ReadTemplate {
                path: decl.source,
                id,
                error: io::Error::new(io::ErrorKind::NotFound, "template is not bundled"),
            }),
        })
        .collect()
}
