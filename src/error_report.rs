use std::fmt;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use crate::catalog::{LoadError, UnknownPlaceholder};
use crate::input::LoadTomlError;
use crate::plan::PlanError;
use crate::render::RenderError;
use crate::tokens::TokenKey;
use crate::types::{InvalidIdentifier, InvalidIdentifierReason};
use crate::{ExitStatus, GenerateError};

pub trait IntoDiagnostic: Sized {
    fn into_diagnostic<FileId: Copy>(self, file_id: FileId) -> Diagnostic<FileId>;
}

/// Prints the diagnostic against `source` and exits with the validation failure code.
pub trait Report {
    fn report<Name: fmt::Display + Clone, Source: AsRef<str>>(self, name: Name, source: Source) -> !;
}

/// Errors that know which text to point into.
pub trait Fatal {
    fn fail(self) -> !;
}

fn emit<Name: fmt::Display + Clone, Source: AsRef<str>>(diagnostic: &Diagnostic<()>, name: Name, source: Source) {
    let file = SimpleFile::new(name, source);
    let mut out = StandardStream::stderr(ColorChoice::Auto);
    if let Err(error) = codespan_reporting::term::emit(&mut out, &Default::default(), &file, diagnostic) {
        eprintln!("error: {}", diagnostic.message);
        tracing::debug!(%error, "failed to render diagnostic");
    }
}

fn exit() -> ! {
    std::process::exit(ExitStatus::ValidationFailure.code())
}

impl<T: IntoDiagnostic> Report for T {
    fn report<Name: fmt::Display + Clone, Source: AsRef<str>>(self, name: Name, source: Source) -> ! {
        emit(&self.into_diagnostic(()), name, source);
        exit()
    }
}

fn known_keys() -> String {
    let keys = TokenKey::ALL.iter().map(|key| key.as_str()).collect::<Vec<_>>();
    format!("known placeholders: {}", keys.join(", "))
}

/// Collects the messages of the error's sources.
fn causes(error: &dyn std::error::Error) -> Vec<String> {
    let mut notes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        notes.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    notes
}

impl IntoDiagnostic for UnknownPlaceholder {
    fn into_diagnostic<FileId: Copy>(self, file_id: FileId) -> Diagnostic<FileId> {
        Diagnostic::error()
            .with_message(format!("unknown placeholder [{}] in template {}", self.key, self.template))
            .with_labels(vec![Label::primary(file_id, self.span).with_message("this placeholder is not known")])
            .with_notes(vec![known_keys()])
    }
}

impl IntoDiagnostic for InvalidIdentifier {
    fn into_diagnostic<FileId: Copy>(self, file_id: FileId) -> Diagnostic<FileId> {
        let label = match self.reason {
            InvalidIdentifierReason::Empty => None,
            InvalidIdentifierReason::LeadingDigit => Some(Label::primary(file_id, 0..1).with_message("names can not start with a digit")),
            InvalidIdentifierReason::InvalidChar { c, pos } => Some(Label::primary(file_id, pos..(pos + c.len_utf8())).with_message("This char is invalid")),
        };

        Diagnostic::error()
            .with_message(match self.reason {
                InvalidIdentifierReason::Empty => "module name is empty",
                _ => "invalid module name",
            })
            .with_labels(label.into_iter().collect())
            .with_notes(vec!["module names consist of ASCII letters, digits and _".to_owned()])
    }
}

impl Fatal for LoadTomlError {
    fn fail(self) -> ! {
        let source = std::fs::read_to_string(self.path()).unwrap_or_default();
        let mut diagnostic = Diagnostic::error()
            .with_message(self.to_string())
            .with_notes(causes(&self));
        if let Some(span) = self.parse_span(&source) {
            diagnostic = diagnostic.with_labels(vec![Label::primary((), span).with_message("here")]);
        }
        emit(&diagnostic, self.path().display().to_string(), &source);
        exit()
    }
}

impl Fatal for LoadError {
    fn fail(self) -> ! {
        match self {
            LoadError::Manifest(error) => error.fail(),
            LoadError::UnknownPlaceholder(error) => {
                let name = format!("{} ({})", error.template, error.field);
                let text = error.text.clone();
                error.report(name, text)
            },
            other => {
                let diagnostic = Diagnostic::error()
                    .with_message(other.to_string())
                    .with_notes(causes(&other));
                emit(&diagnostic, "", "");
                exit()
            },
        }
    }
}

impl Fatal for GenerateError {
    fn fail(self) -> ! {
        let diagnostic = match self {
            GenerateError::Plan(PlanError::InvalidIdentifier(error)) => {
                let name = error.string.clone();
                error.report("module name", name)
            },
            GenerateError::UnknownOverride(error) => Diagnostic::error()
                .with_message(format!("{} can not be overridden", error.0))
                .with_notes(vec![known_keys()]),
            GenerateError::UnknownTag(error) => Diagnostic::error()
                .with_message(error.to_string())
                .with_notes(vec!["run with --list to see the available tags".to_owned()]),
            GenerateError::Plan(PlanError::Render(RenderError::MissingToken { template, key, field })) => Diagnostic::error()
                .with_message(format!("no value for [{}] in the {} of template {}", key, field, template)),
            GenerateError::Plan(PlanError::Render(RenderError::InvalidDestination { template, path })) => Diagnostic::error()
                .with_message(format!("template {} renders to an invalid destination", template))
                .with_notes(vec![
                    format!("rendered path: {}", path),
                    "destinations must be relative paths inside the project root".to_owned(),
                ]),
            GenerateError::Plan(PlanError::PathCollision { path, first, second }) => Diagnostic::error()
                .with_message(format!("templates write the same file {}", path.display()))
                .with_notes(vec![
                    format!("first written by template {}", first),
                    format!("then by template {}", second),
                    "nothing was written".to_owned(),
                ]),
            GenerateError::Plan(PlanError::FileAsDirectory { file, file_template, nested, nested_template }) => Diagnostic::error()
                .with_message(format!("{} would have to be both a file and a directory", file.display()))
                .with_notes(vec![
                    format!("template {} writes it as a file", file_template),
                    format!("template {} writes {} below it", nested_template, nested.display()),
                    "nothing was written".to_owned(),
                ]),
        };
        emit(&diagnostic, "", "");
        exit()
    }
}
