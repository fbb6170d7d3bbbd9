//! Virtual Machine core
//!
//! The VM owns the frame stack for one statement list. Function calls get
//! their own VM; the shared [`Runtime`] carries the resolver, limits and
//! counters across all of them.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use super::types::{
    AssignPhase, BlockPhase, BreakPhase, ContinuePhase, Control, DeclarePhase, Env, ExprPhase,
    Fault, ForLoopPhase, ForPhase, Frame, FrameKind, FunctionPhase, IfPhase, ReturnPhase, Span,
    Stmt, ThrowPhase, TryPhase, Val, WhilePhase,
};
use crate::sandbox::Resolve;

/* ===================== Limits ===================== */

/// Resource limits for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Statement steps plus function calls before the run is aborted
    pub max_steps: u64,
    /// Nested function calls before the run is aborted
    pub max_call_depth: usize,
    /// Nested expression evaluations, counted across calls, before the run is aborted
    pub max_expr_depth: usize,
    /// Longest array or string a program may build
    pub max_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            max_call_depth: 128,
            max_expr_depth: 512,
            max_length: 1 << 24,
        }
    }
}

/* ===================== Runtime ===================== */

/// State shared by every VM taking part in one evaluation
pub struct Runtime<'r> {
    /// The only way out of the sandbox
    pub resolver: &'r dyn Resolve,
    pub limits: Limits,
    /// Steps taken so far
    pub steps: u64,
    /// Current function call depth
    pub depth: usize,
    /// Current expression nesting, across calls
    pub expr_depth: usize,
    /// Spans of the statements an in-flight throw passed through, innermost first
    pub trace: Vec<Span>,
}

impl<'r> Runtime<'r> {
    pub fn new(resolver: &'r dyn Resolve, limits: Limits) -> Self {
        Self {
            resolver,
            limits,
            steps: 0,
            depth: 0,
            expr_depth: 0,
            trace: Vec::new(),
        }
    }

    /// Count one unit of work against the step budget
    pub fn tick(&mut self) -> Result<(), Fault> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(Fault::StepLimit {
                limit: self.limits.max_steps,
            });
        }
        Ok(())
    }

    /// Enter one level of expression nesting; pair with [`Runtime::leave_expr`]
    pub fn enter_expr(&mut self) -> Result<(), Fault> {
        if self.expr_depth >= self.limits.max_expr_depth {
            return Err(Fault::ExprDepth {
                limit: self.limits.max_expr_depth,
            });
        }
        self.expr_depth += 1;
        Ok(())
    }

    pub fn leave_expr(&mut self) {
        self.expr_depth = self.expr_depth.saturating_sub(1);
    }
}

/* ===================== VM ===================== */

/// Virtual Machine state
#[derive(Debug)]
pub struct VM {
    /// Execution frame stack
    pub frames: Vec<Frame>,

    /// Current control flow state
    pub control: Control,

    /// Current scope
    pub env: Env,

    /// Value of the most recent expression statement
    pub completion: Option<Val>,
}

impl VM {
    /// Create a VM that will run `program` in `env`
    pub fn new(program: Stmt, env: Env) -> Self {
        let mut vm = VM {
            frames: vec![],
            control: Control::None,
            env,
            completion: None,
        };
        push_stmt(&mut vm, &program);
        vm
    }

    /// True once every frame has been popped
    pub fn is_done(&self) -> bool {
        self.frames.is_empty()
    }
}

/* ===================== Frame Management ===================== */

/// Push a new frame onto the stack for a statement
pub fn push_stmt(vm: &mut VM, stmt: &Stmt) {
    let kind = match stmt {
        Stmt::Return { .. } => FrameKind::Return {
            phase: ReturnPhase::Eval,
        },
        Stmt::Throw { .. } => FrameKind::Throw {
            phase: ThrowPhase::Eval,
        },
        Stmt::Block { .. } => FrameKind::Block {
            phase: BlockPhase::Enter,
            idx: 0,
            outer: None,
        },
        Stmt::Try { .. } => FrameKind::Try {
            phase: TryPhase::NotStarted,
            saved: None,
            outer: None,
        },
        Stmt::Expr { .. } => FrameKind::Expr {
            phase: ExprPhase::Eval,
        },
        Stmt::Assign { .. } => FrameKind::Assign {
            phase: AssignPhase::Eval,
        },
        Stmt::If { .. } => FrameKind::If {
            phase: IfPhase::Eval,
        },
        Stmt::While { .. } => FrameKind::While {
            phase: WhilePhase::Eval,
            label: None,
        },
        Stmt::For { .. } => FrameKind::For {
            phase: ForPhase::Init,
            outer: None,
        },
        Stmt::ForLoop { .. } => FrameKind::ForLoop {
            phase: ForLoopPhase::Iterate,
            items: None,
            idx: 0,
            outer: None,
        },
        Stmt::Break { .. } => FrameKind::Break {
            phase: BreakPhase::Execute,
        },
        Stmt::Continue { .. } => FrameKind::Continue {
            phase: ContinuePhase::Execute,
        },
        Stmt::Declare { .. } => FrameKind::Declare {
            phase: DeclarePhase::Eval,
        },
        // Module items are rejected before a VM is built; treat them as no-ops
        Stmt::Function { .. }
        | Stmt::Import { .. }
        | Stmt::ExportDefault { .. }
        | Stmt::ExportDecl { .. }
        | Stmt::ExportNamed { .. } => FrameKind::Function {
            phase: FunctionPhase::Declare,
        },
    };

    vm.frames.push(Frame {
        kind,
        node: Rc::new(stmt.clone()),
    });
}
