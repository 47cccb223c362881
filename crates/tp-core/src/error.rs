use crate::diagnostics::Diagnostic;
use std::fmt::Display;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no path from `{from}` to `{to}` within {depth} levels ({explored} edges explored)")]
    NotReachable {
        from: String,
        to: String,
        depth: usize,
        explored: usize,
    },
    #[error(
        "cannot compose `{source_type}` into `{destination_type}`: field `{field}` of type `{field_type}`: {reason}"
    )]
    CompositionFailure {
        source_type: String,
        destination_type: String,
        field: String,
        field_type: String,
        reason: String,
    },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn not_reachable(from: impl Display, to: impl Display, depth: usize, explored: usize) -> Self {
        Error::NotReachable {
            from: from.to_string(),
            to: to.to_string(),
            depth,
            explored,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Error::InvariantViolation(message.into())
    }

    /// Attach the location of the failure (a step, a field, a partial path)
    /// to invariant and generic errors. Structured variants already carry
    /// their context and are returned unchanged.
    pub fn context(self, context: impl Display) -> Self {
        match self {
            Error::InvariantViolation(message) => {
                Error::InvariantViolation(format!("{message} ({context})"))
            }
            Error::Generic(message) => Error::Generic(format!("{message} ({context})")),
            other => other,
        }
    }

    pub fn is_not_reachable(&self) -> bool {
        matches!(self, Error::NotReachable { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::NotReachable { .. } => "TP0001",
            Error::CompositionFailure { .. } => "TP0002",
            Error::InvariantViolation(_) => "TP0003",
            Error::Generic(_) => "TP0000",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string()).with_code(self.code());
        match self {
            Error::NotReachable { from, to, .. } => diagnostic
                .with_suggestion(format!("register a known conversion from `{from}` to `{to}`")),
            Error::CompositionFailure {
                field, field_type, ..
            } => diagnostic.with_suggestion(format!(
                "add a source field for `{field}` or annotate it so it can be skipped (`{field_type}`)"
            )),
            Error::InvariantViolation(_) => {
                diagnostic.with_source_context("internal contract of the synthesis engine")
            }
            Error::Generic(_) => diagnostic,
        }
    }
}

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

// Convert from std::io::Error to our Error type
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
