//! Lexical scopes
//!
//! Each block, loop iteration and function call gets its own scope chained to
//! the enclosing one. Closures hold on to the scope they were created in.

use super::super::errors::ErrorInfo;
use super::ast::VarKind;
use super::values::Val;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Binding {
    value: Val,
    kind: VarKind,
}

struct Scope {
    vars: RefCell<HashMap<String, Binding>>,
    parent: Option<Env>,
}

/// Handle to a scope; cloning shares the scope
#[derive(Clone)]
pub struct Env(Rc<Scope>);

impl Env {
    /// A scope with no parent
    pub fn root() -> Env {
        Env(Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// A new scope nested inside this one
    pub fn child(&self) -> Env {
        Env(Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Bind a name in this scope, shadowing any outer binding
    pub fn declare(&self, name: impl Into<String>, value: Val, kind: VarKind) {
        self.0
            .vars
            .borrow_mut()
            .insert(name.into(), Binding { value, kind });
    }

    /// Look a name up through the scope chain
    pub fn get(&self, name: &str) -> Option<Val> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(binding) = env.0.vars.borrow().get(name) {
                return Some(binding.value.clone());
            }
            scope = env.0.parent.as_ref();
        }
        None
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared directly in this scope (not a parent)
    pub fn has_own(&self, name: &str) -> bool {
        self.0.vars.borrow().contains_key(name)
    }

    /// Reassign an existing binding in the nearest scope that declares it
    pub fn assign(&self, name: &str, value: Val) -> Result<(), ErrorInfo> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(binding) = env.0.vars.borrow_mut().get_mut(name) {
                if binding.kind == VarKind::Const {
                    return Err(ErrorInfo::type_error("Assignment to constant variable."));
                }
                binding.value = value;
                return Ok(());
            }
            scope = env.0.parent.as_ref();
        }
        Err(ErrorInfo::reference_error(format!(
            "{} is not defined",
            name
        )))
    }
}

impl PartialEq for Env {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.vars.borrow().keys().cloned().collect();
        f.debug_struct("Env").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_scope_shadows_and_restores() {
        let outer = Env::root();
        outer.declare("x", Val::Num(1.0), VarKind::Let);

        let inner = outer.child();
        inner.declare("x", Val::Num(2.0), VarKind::Let);

        assert_eq!(inner.get("x"), Some(Val::Num(2.0)));
        assert_eq!(outer.get("x"), Some(Val::Num(1.0)));
    }

    #[test]
    fn test_assign_walks_to_declaring_scope() {
        let outer = Env::root();
        outer.declare("count", Val::Num(0.0), VarKind::Let);

        let inner = outer.child();
        inner.assign("count", Val::Num(5.0)).unwrap();

        assert_eq!(outer.get("count"), Some(Val::Num(5.0)));
        assert!(!inner.has_own("count"));
    }

    #[test]
    fn test_assign_to_const_fails() {
        let env = Env::root();
        env.declare("answer", Val::Num(42.0), VarKind::Const);

        let err = env.assign("answer", Val::Num(1.0)).unwrap_err();
        assert_eq!(err.code, "TypeError");
        assert_eq!(err.message, "Assignment to constant variable.");
    }

    #[test]
    fn test_assign_undeclared_fails() {
        let env = Env::root();
        let err = env.assign("missing", Val::Null).unwrap_err();
        assert_eq!(err.code, "ReferenceError");
        assert_eq!(err.message, "missing is not defined");
    }
}
