//! Error codes and utilities
//!
//! Defines the error codes carried by thrown `Val::Error` payloads. Codes match
//! the constructor names user code sees through `err.name`.

use serde::{Deserialize, Serialize};

use super::types::Val;

/// Error information with code and message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (e.g., "TypeError", "ReferenceError")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(TYPE_ERROR, message)
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::new(REFERENCE_ERROR, message)
    }

    /// Wrap as a throwable value
    pub fn into_val(self) -> Val {
        Val::Error(self)
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Error code: generic `Error` constructed by user code
pub const ERROR: &str = "Error";

/// Error code: Type error (wrong type for operation, not callable, const reassignment)
pub const TYPE_ERROR: &str = "TypeError";

/// Error code: Reference to an undeclared variable
pub const REFERENCE_ERROR: &str = "ReferenceError";

/// Error code: Value out of range, also used for sandbox limits
pub const RANGE_ERROR: &str = "RangeError";

/// Error code: Code the evaluator cannot run (leftover module syntax or JSX)
pub const SYNTAX_ERROR: &str = "SyntaxError";

/// Error code: Internal error (should not happen - frame/node mismatch)
pub const INTERNAL_ERROR: &str = "InternalError";
