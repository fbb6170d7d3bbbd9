//! # Executor - Sandboxed Stack-Driven Interpreter
//!
//! Runs target code produced by the transform stage.
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: Statement state lives in `frames: Vec<Frame>`
//! 2. **Centralized control flow**: `Control` carries break/continue/return/throw
//! 3. **Faults are not exceptions**: unresolved imports and exhausted limits
//!    abort the run; `try`/`catch` never sees them
//! 4. **Closed world**: intrinsics, `require` and `exports` are the only
//!    names a program starts with

pub mod builtins;
pub mod errors;
pub mod evaluator;
pub mod exec_loop;
pub mod expressions;
pub mod json;
pub mod statements;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use evaluator::{Executor, ResultMode, SandboxEvaluator};
pub use exec_loop::{run_until_done, step};
pub use expressions::{call_value, Abrupt, EvalResult};
pub use types::{Control, Env, ErrorInfo, Expr, Fault, NativeFn, Stmt, Val};
pub use vm::{Limits, Runtime, VM};
