//! Type definitions for the executor
//!
//! This module contains all the core types used by the executor:
//! - AST nodes (Stmt, Expr)
//! - Runtime values (Val) and scopes (Env)
//! - Control flow (Control, Frame, FrameKind)
//! - Execution phases (Phase enums for each statement type)

pub mod ast;
pub mod control;
pub mod env;
pub mod phase;
pub mod values;
pub mod visit;

// Re-export all types for convenient access
pub use super::builtins::Builtin;
pub use super::errors::ErrorInfo;
pub use ast::{
    DeclareTarget, Expr, ForLoopKind, FunctionDef, MemberAccess, Module, Span, Stmt, VarKind,
};
pub use control::{Control, Fault, Frame, FrameKind};
pub use env::Env;
pub use phase::*;
pub use values::{Closure, NativeFn, Val};
