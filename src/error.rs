//! Error types for the transpile pipeline
//!
//! Every failure a request can end in flows through [`TranspileError`]:
//! - transform failures (syntax, gated syntax, validation, configuration)
//! - imports the scope does not provide
//! - errors thrown while running the target code

use std::fmt;

use crate::executor::types::{Span, Val};

/// 1-based source position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Start of a 0-indexed span
    pub fn from_span(span: &Span) -> Self {
        Self {
            line: span.start_line + 1,
            column: span.start_col + 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Any failure reported to the error handler
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranspileError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    UnresolvedImport(#[from] UnresolvedImportError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl TranspileError {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            TranspileError::Transform(_) => "transform",
            TranspileError::UnresolvedImport(_) => "unresolved-import",
            TranspileError::Runtime(_) => "runtime",
        }
    }
}

/// Failure of the transform stage; no target code is produced
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Malformed source, or syntax no configured pass enables
    #[error("SyntaxError: {message}{}", at(.location))]
    Syntax {
        message: String,
        location: Option<Location>,
    },

    /// Well-formed source that breaks a structural rule
    #[error("SyntaxError: {message}{} [{rule}]", at(.location))]
    Validation {
        message: String,
        rule: &'static str,
        location: Option<Location>,
    },

    /// Unknown or duplicate preset/plugin
    #[error("Invalid transform configuration: {0}")]
    Config(String),
}

impl TransformError {
    pub fn syntax(message: impl Into<String>, span: Option<Span>) -> Self {
        TransformError::Syntax {
            message: message.into(),
            location: span.as_ref().map(Location::from_span),
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            TransformError::Syntax { location, .. } => *location,
            TransformError::Validation { location, .. } => *location,
            TransformError::Config(_) => None,
        }
    }
}

fn at(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" ({})", loc),
        None => String::new(),
    }
}

/// `require` asked for something the scope does not provide
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No import found at `{specifier}`, did you specify it in scope?")]
pub struct UnresolvedImportError {
    pub specifier: String,
}

impl UnresolvedImportError {
    pub fn new(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
        }
    }
}

/// An error escaped the running program
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}{}", at(.location))]
pub struct RuntimeError {
    /// The thrown value as user code saw it
    pub payload: Val,
    pub message: String,
    /// Innermost source location, when known
    pub location: Option<Location>,
    /// Statement locations the error passed through, innermost first
    pub trace: Vec<Location>,
}

impl RuntimeError {
    pub fn new(payload: Val, message: impl Into<String>) -> Self {
        Self {
            payload,
            message: message.into(),
            location: None,
            trace: vec![],
        }
    }

    pub fn with_trace(mut self, trace: Vec<Location>) -> Self {
        self.location = trace.first().copied();
        self.trace = trace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_import_message() {
        let err = UnresolvedImportError::new("bar");
        assert_eq!(
            err.to_string(),
            "No import found at `bar`, did you specify it in scope?"
        );
    }

    #[test]
    fn test_syntax_error_display_includes_location() {
        let err = TransformError::Syntax {
            message: "Unexpected token".to_string(),
            location: Some(Location::new(3, 7)),
        };
        assert_eq!(err.to_string(), "SyntaxError: Unexpected token (3:7)");
    }

    #[test]
    fn test_runtime_error_location_comes_from_trace() {
        let err = RuntimeError::new(Val::str("boom"), "boom")
            .with_trace(vec![Location::new(2, 1), Location::new(5, 3)]);
        assert_eq!(err.location, Some(Location::new(2, 1)));
        assert_eq!(
            TranspileError::from(err).to_string(),
            "boom (2:1)"
        );
    }
}
