//! Error taxonomy.
//!
//! Load errors are fatal for the whole run. Emission errors are scoped to one
//! module. Unrecognized types and validation failures are never `Err`s; they
//! travel as [`Diagnostic`] values inside reports.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid description ({origin}): {message}")]
    Syntax { origin: String, message: String },
    #[error("malformed model at {path}: {message}")]
    Malformed { path: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("unbalanced brackets in rendered type `{rendered}` ({subject})")]
    Unbalanced { subject: String, rendered: String },
    #[error("`{name}` is not a valid Lua identifier ({subject})")]
    InvalidIdentifier { subject: String, name: String },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read type table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid type table {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl LoadError {
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::Malformed { path: path.into(), message: message.into() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DIAGNOSTICS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// A raw type token the normalizer could not classify.
    UnrecognizedType,
    /// A bare multi-word primitive fragment that was completed.
    CompletedFragment,
}

/// Non-fatal finding of a pipeline stage, returned by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Entity path, e.g. `graphics.Image.getWidth#1.x`.
    pub subject: String,
    pub message: String,
    /// Offending raw text.
    pub text: String,
}
