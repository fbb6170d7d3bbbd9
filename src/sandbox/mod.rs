//! Sandbox module resolution
//!
//! The scope mapping is the whole world a program can see beyond its own
//! code and the language intrinsics. `require(specifier)` goes through a
//! [`Resolve`] implementation and nothing else.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::UnresolvedImportError;
use crate::executor::json::json_to_val_map;
use crate::executor::Val;

/* ===================== Scope Mapping ===================== */

/// Immutable identifier → value mapping supplied with a request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeMapping {
    entries: BTreeMap<String, Val>,
}

impl ScopeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object (`{"specifier": value, ...}`)
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let entries = json_to_val_map(json).context("Scope must be a JSON object")?;
        Ok(Self { entries })
    }

    /// Builder-style insert, used while assembling the mapping
    pub fn with(mut self, specifier: impl Into<String>, value: impl Into<Val>) -> Self {
        self.entries.insert(specifier.into(), value.into());
        self
    }

    pub fn get(&self, specifier: &str) -> Option<&Val> {
        self.entries.get(specifier)
    }

    pub fn contains(&self, specifier: &str) -> bool {
        self.entries.contains_key(specifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn specifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Val)> for ScopeMapping {
    fn from_iter<I: IntoIterator<Item = (K, Val)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<BTreeMap<String, Val>> for ScopeMapping {
    fn from(entries: BTreeMap<String, Val>) -> Self {
        Self { entries }
    }
}

impl From<std::collections::HashMap<String, Val>> for ScopeMapping {
    fn from(entries: std::collections::HashMap<String, Val>) -> Self {
        entries.into_iter().collect()
    }
}

/* ===================== Resolution ===================== */

/// Capability handed to the executor for `require`
pub trait Resolve {
    fn resolve(&self, specifier: &str) -> Result<Val, UnresolvedImportError>;
}

/// Resolver bound to one scope mapping
///
/// Holds a shared borrow, so nothing downstream can write to the mapping.
#[derive(Debug, Clone, Copy)]
pub struct SandboxResolver<'a> {
    scope: &'a ScopeMapping,
}

impl<'a> SandboxResolver<'a> {
    pub fn new(scope: &'a ScopeMapping) -> Self {
        Self { scope }
    }
}

impl Resolve for SandboxResolver<'_> {
    fn resolve(&self, specifier: &str) -> Result<Val, UnresolvedImportError> {
        resolve(specifier, self.scope)
    }
}

/// Look `specifier` up strictly inside `scope`
pub fn resolve(specifier: &str, scope: &ScopeMapping) -> Result<Val, UnresolvedImportError> {
    match scope.get(specifier) {
        Some(value) => {
            debug!(specifier, "Resolved import from scope");
            Ok(value.clone())
        }
        None => {
            debug!(specifier, "Import not present in scope");
            Err(UnresolvedImportError::new(specifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use serde_json::json;

    #[test]
    fn test_resolve_present_specifier() {
        let scope = ScopeMapping::from(btreemap! {
            "bar".to_string() => Val::Num(42.0),
        });
        assert_eq!(resolve("bar", &scope), Ok(Val::Num(42.0)));
    }

    #[test]
    fn test_resolve_missing_specifier_names_it() {
        let scope = ScopeMapping::new();
        let err = resolve("bar", &scope).unwrap_err();
        assert_eq!(err.specifier, "bar");
    }

    #[test]
    fn test_falsy_values_still_resolve() {
        let scope = ScopeMapping::new()
            .with("zero", 0.0)
            .with("nothing", Val::Null);
        assert_eq!(resolve("zero", &scope), Ok(Val::Num(0.0)));
        assert_eq!(resolve("nothing", &scope), Ok(Val::Null));
    }

    #[test]
    fn test_no_ambient_fallback() {
        // Intrinsic names are not importable unless the scope provides them
        let scope = ScopeMapping::new();
        assert!(resolve("Math", &scope).is_err());
        assert!(resolve("require", &scope).is_err());
    }

    #[test]
    fn test_scope_from_json() {
        let scope = ScopeMapping::from_json(&json!({"bar": {"Foo": 42}})).unwrap();
        let resolver = SandboxResolver::new(&scope);
        let Val::Obj(module) = resolver.resolve("bar").unwrap() else {
            unreachable!("Expected object module");
        };
        assert_eq!(module.borrow().get("Foo"), Some(&Val::Num(42.0)));
    }

    #[test]
    fn test_scope_from_json_rejects_non_object() {
        assert!(ScopeMapping::from_json(&json!([1, 2])).is_err());
    }
}
