//! Structural validation of parsed modules
//!
//! Runs after parsing and before any pass, catching programs the grammar
//! accepts but that no correct transform could produce output for.
//!
//! # Architecture
//!
//! 1. **ValidationRule trait** - Each rule implements this trait
//! 2. **Validator** - Collects and runs all rules
//! 3. **ValidationError** - The output of validation (errors, warnings)
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `validate/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod rules;

use tracing::warn;

use crate::error::{Location, TransformError};
use crate::executor::types::ast::{Module, Span};

// ============================================================================
// Validation Error Types
// ============================================================================

/// A problem found by a rule
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub span: Span,
    pub message: String,
    pub severity: Severity,
    /// Which rule produced this error
    pub rule_id: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The module cannot be transformed
    Error,
    /// Suspicious but transformable
    Warning,
}

impl ValidationError {
    pub fn error(span: Span, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            span,
            message: message.into(),
            severity: Severity::Error,
            rule_id,
        }
    }

    pub fn warning(span: Span, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            span,
            message: message.into(),
            severity: Severity::Warning,
            rule_id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{} at line {}, col {}: {} [{}]",
            severity,
            self.span.start_line + 1,
            self.span.start_col + 1,
            self.message,
            self.rule_id
        )
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for TransformError {
    fn from(err: ValidationError) -> Self {
        TransformError::Validation {
            message: err.message,
            rule: err.rule_id,
            location: Some(Location::from_span(&err.span)),
        }
    }
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// One structural check
pub trait ValidationRule {
    /// Unique identifier for this rule (e.g., "return-outside-function")
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Run the check; an empty vector means no issues
    fn validate(&self, module: &Module, source: &str) -> Vec<ValidationError>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::ModuleItemPlacementRule),
                Box::new(rules::ReturnOutsideFunctionRule),
                Box::new(rules::LoopControlRule),
                Box::new(rules::DuplicateDeclarationRule),
                Box::new(rules::UndefinedExportRule),
                // Warnings
                Box::new(rules::UnusedImportRule),
            ],
        }
    }

    /// Run all rules; results are ordered by source position
    pub fn validate(&self, module: &Module, source: &str) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(module, source))
            .collect();
        errors.sort_by_key(|e| (e.span.start_line, e.span.start_col));
        errors
    }

    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Public API
// ============================================================================

pub fn validate_module(module: &Module, source: &str) -> Vec<ValidationError> {
    Validator::new().validate(module, source)
}

/// Fail with the first error; warnings are logged and never fail a transform
pub fn check(module: &Module, source: &str) -> Result<(), TransformError> {
    let mut first_error = None;
    for finding in validate_module(module, source) {
        if !finding.is_error() {
            warn!(rule = finding.rule_id, "{}", finding);
        } else if first_error.is_none() {
            first_error = Some(finding);
        }
    }
    match first_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;
