//! Runtime value types

use super::super::builtins::Builtin;
use super::super::errors::ErrorInfo;
use super::ast::FunctionDef;
use super::env::Env;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable array storage
pub type ListRef = Rc<RefCell<Vec<Val>>>;

/// Shared, mutable object storage; keys are kept ordered for deterministic output
pub type ObjRef = Rc<RefCell<BTreeMap<String, Val>>>;

/// Host function signature for values supplied through the scope mapping
pub type HostFn = dyn Fn(&[Val]) -> Result<Val, ErrorInfo>;

/// Runtime value type
///
/// Arrays and objects are references, like the language they model: two
/// bindings of the same object observe each other's writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(ListRef),
    Obj(ObjRef),
    /// Builtin function with optional bound arguments
    /// Empty bindings = standalone function, non-empty = bound method
    Func {
        func: Builtin,
        bindings: Vec<Val>,
    },
    /// Function defined by the running program
    Closure(Closure),
    /// Function supplied by the host
    Native(NativeFn),
    /// Error value with code and message
    Error(ErrorInfo),
}

impl Val {
    pub fn list(items: Vec<Val>) -> Val {
        Val::List(Rc::new(RefCell::new(items)))
    }

    pub fn obj(map: BTreeMap<String, Val>) -> Val {
        Val::Obj(Rc::new(RefCell::new(map)))
    }

    pub fn empty_obj() -> Val {
        Val::obj(BTreeMap::new())
    }

    pub fn str(s: impl Into<String>) -> Val {
        Val::Str(s.into())
    }

    /// Check if value is truthy (for conditionals)
    ///
    /// Follows JavaScript truthiness rules:
    /// - Falsy: false, null, undefined, 0, -0, NaN, "" (empty string)
    /// - Truthy: everything else (including "0", "false", [], {})
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Bool(b) => *b,
            Val::Null | Val::Undefined => false,
            Val::Num(n) => *n != 0.0 && !n.is_nan(),
            Val::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// `null` or `undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Val::Null | Val::Undefined)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Val::Func { .. } | Val::Closure(_) | Val::Native(_))
    }

    /// Result of the `typeof` operator
    pub fn type_of(&self) -> &'static str {
        match self {
            Val::Undefined => "undefined",
            Val::Null => "object",
            Val::Bool(_) => "boolean",
            Val::Num(_) => "number",
            Val::Str(_) => "string",
            Val::List(_) | Val::Obj(_) | Val::Error(_) => "object",
            Val::Func { .. } | Val::Closure(_) | Val::Native(_) => "function",
        }
    }

    /// Copy arrays and objects all the way down, so the copy shares no storage
    pub fn deep_clone(&self) -> Val {
        match self {
            Val::List(items) => Val::list(items.borrow().iter().map(Val::deep_clone).collect()),
            Val::Obj(map) => Val::obj(
                map.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Same-reference identity used by `===` for arrays, objects and functions
    pub fn same_ref(&self, other: &Val) -> bool {
        match (self, other) {
            (Val::List(a), Val::List(b)) => Rc::ptr_eq(a, b),
            (Val::Obj(a), Val::Obj(b)) => Rc::ptr_eq(a, b),
            (Val::Closure(a), Val::Closure(b)) => a == b,
            (Val::Native(a), Val::Native(b)) => a == b,
            (Val::Func { .. }, Val::Func { .. }) => self == other,
            _ => false,
        }
    }
}

impl From<f64> for Val {
    fn from(n: f64) -> Self {
        Val::Num(n)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::Str(s.to_string())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::Str(s)
    }
}

impl From<Vec<Val>> for Val {
    fn from(items: Vec<Val>) -> Self {
        Val::list(items)
    }
}

impl From<BTreeMap<String, Val>> for Val {
    fn from(map: BTreeMap<String, Val>) -> Self {
        Val::obj(map)
    }
}

/* ===================== Callables ===================== */

/// A function value closing over the scope it was created in
#[derive(Clone)]
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub env: Env,
}

impl Closure {
    pub fn name(&self) -> &str {
        self.def.name.as_deref().unwrap_or("anonymous")
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.def, &other.def) && self.env == other.env
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name())
    }
}

/// A host-provided function
#[derive(Clone)]
pub struct NativeFn {
    name: String,
    func: Rc<HostFn>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[Val]) -> Result<Val, ErrorInfo> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Val]) -> Result<Val, ErrorInfo> {
        (self.func)(args)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}
