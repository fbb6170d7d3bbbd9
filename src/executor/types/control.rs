//! Control flow and execution frame types

use super::ast::Stmt;
use super::env::Env;
use super::phase::{
    AssignPhase, BlockPhase, BreakPhase, ContinuePhase, DeclarePhase, ExprPhase, ForLoopPhase,
    ForPhase, FunctionPhase, IfPhase, ReturnPhase, ThrowPhase, TryPhase, WhilePhase,
};
use super::values::Val;
use std::rc::Rc;

/* ===================== Control Flow ===================== */

/// Control flow state
///
/// This represents active control flow (return, break, continue, throw, fault).
/// When control != None, the VM unwinds the stack to find the appropriate handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    None,
    Break(Option<String>),    // Optional loop label
    Continue(Option<String>), // Optional loop label
    Return(Val),
    Throw(Val),
    /// Sandbox fault; never intercepted by try/catch/finally
    Fault(Fault),
}

/// Conditions that abort a run regardless of user code
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// `require` asked for a specifier the scope mapping does not contain
    UnresolvedImport { specifier: String },
    /// Step budget exhausted
    StepLimit { limit: u64 },
    /// Call nesting exceeded the configured depth
    CallDepth { limit: usize },
    /// Expression nesting exceeded the configured depth
    ExprDepth { limit: usize },
}

/* ===================== Frames ===================== */

/// Frame kind - the type and state of a statement being executed
#[derive(Debug, Clone)]
pub enum FrameKind {
    Return {
        phase: ReturnPhase,
    },
    Throw {
        phase: ThrowPhase,
    },
    Block {
        phase: BlockPhase,
        idx: usize,
        /// Scope to restore when the block exits
        outer: Option<Env>,
    },
    Try {
        phase: TryPhase,
        /// Control flow suspended while the finally body runs
        saved: Option<Box<Control>>,
        outer: Option<Env>,
    },
    Expr {
        phase: ExprPhase,
    },
    Assign {
        phase: AssignPhase,
    },
    If {
        phase: IfPhase,
    },
    While {
        phase: WhilePhase,
        label: Option<String>,
    },
    For {
        phase: ForPhase,
        outer: Option<Env>,
    },
    ForLoop {
        phase: ForLoopPhase,
        /// Items to iterate over (None = iterable not yet evaluated)
        items: Option<Rc<Vec<Val>>>,
        /// Current iteration index
        idx: usize,
        outer: Option<Env>,
    },
    Break {
        phase: BreakPhase,
    },
    Continue {
        phase: ContinuePhase,
    },
    Declare {
        phase: DeclarePhase,
    },
    Function {
        phase: FunctionPhase,
    },
}

/// Execution frame - one per active statement
///
/// The frame stack replaces the system call stack for statements; function
/// calls run on a nested VM.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The kind and state of this frame
    pub kind: FrameKind,

    /// The AST node (statement) this frame represents
    pub node: Rc<Stmt>,
}
