//! YAML error types with source-annotated diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors from reading a YAML document
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A YAML syntax or shape error pointing at the offending location
#[derive(Debug, Error, Diagnostic)]
#[error("Invalid YAML in {filename}: {message}")]
#[diagnostic(code(idesk::yaml::syntax))]
pub struct YamlSyntaxError {
    pub filename: String,
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let span = err
            .location()
            .map(|loc| SourceSpan::from((loc.index().min(content.len()), 1)));

        Self {
            filename: filename.to_string(),
            message: err.to_string(),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }
}
