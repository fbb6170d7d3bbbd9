//! Transform stage: source text → target code
//!
//! ```text
//! source ──parse──▶ Module ──gate──▶ ──validate──▶ ──passes──▶ Module ──codegen──▶ TargetCode
//! ```
//!
//! The stage is a pure function of `(source, config)`: no I/O, no clocks,
//! no randomness, so identical input gives byte-identical output.

pub mod codegen;
pub mod gate;
pub mod names;
pub mod passes;
pub mod source_map;
pub mod validate;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TransformError;
use crate::parser::{parse_module, ParseError};

use passes::{PassContext, Pipeline};
use source_map::SourceMap;

/// Presets and plugins to run, by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub presets: Vec<String>,
    pub plugins: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            presets: vec!["es2015".into(), "stage-1".into(), "react".into()],
            plugins: vec![],
        }
    }
}

impl TransformConfig {
    pub fn new<P, Q>(presets: P, plugins: Q) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
    {
        Self {
            presets: presets.into_iter().map(Into::into).collect(),
            plugins: plugins.into_iter().map(Into::into).collect(),
        }
    }
}

/// Output of a successful transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCode {
    code: String,
}

impl TargetCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn into_string(self) -> String {
        self.code
    }

    /// The inline map, if the code carries one
    pub fn source_map(&self) -> Option<SourceMap> {
        SourceMap::from_code(&self.code)
    }
}

impl fmt::Display for TargetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

impl From<ParseError> for TransformError {
    fn from(err: ParseError) -> Self {
        TransformError::syntax(err.message(), err.span())
    }
}

/// Transform `source` under `config`
pub fn transform(source: &str, config: &TransformConfig) -> Result<TargetCode, TransformError> {
    let pipeline = Pipeline::resolve(config)?;
    debug!(passes = ?pipeline.names(), "Resolved transform pipeline");

    let mut module = parse_module(source)?;
    gate::check(&module, |syntax| pipeline.enables(syntax))?;
    validate::check(&module, source)?;

    let mut cx = PassContext::new(&module);
    pipeline.apply(&mut module, &mut cx);

    let generated = codegen::generate(&module);
    let map = SourceMap::new(source, &generated.mappings);
    debug!(
        statements = module.body.len(),
        mappings = generated.mappings.len(),
        "Generated target code"
    );

    Ok(TargetCode::new(format!(
        "{}\n{}",
        generated.code,
        map.to_comment()
    )))
}

#[cfg(test)]
mod tests;
