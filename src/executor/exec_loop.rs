//! Core execution loop
//!
//! This module contains the step() function - the heart of the interpreter.
//! It processes one frame at a time, advancing execution phases and managing the frame stack.
//!
//! ## Function Organization
//! Functions are ordered by importance/call hierarchy:
//! 1. run_until_done() - Top-level driver (calls step repeatedly)
//! 2. step() - Main execution loop (dispatches to statement handlers)

use super::errors::{self, ErrorInfo};
use super::statements::{
    execute_assign, execute_block, execute_break, execute_continue, execute_declare, execute_expr,
    execute_for, execute_for_loop, execute_function, execute_if, execute_return, execute_throw,
    execute_try, execute_while,
};
use super::types::{Control, FrameKind, Stmt, Val};
use super::vm::{Runtime, VM};

/* ===================== Public API ===================== */

/// Run the VM until it completes
///
/// After completion, inspect `vm.control` for the final state and
/// `vm.completion` for the last expression statement's value.
pub fn run_until_done(vm: &mut VM, rt: &mut Runtime) {
    while !vm.frames.is_empty() {
        step(vm, rt);
    }
}

/// Execute one step of the VM
///
/// This is the core interpreter loop. It:
/// 1. Charges the step against the budget
/// 2. Gets the top frame
/// 3. Dispatches to the appropriate statement handler
/// 4. Each handler manages its own control flow propagation
pub fn step(vm: &mut VM, rt: &mut Runtime) {
    // Get top frame (if any)
    let Some(frame_idx) = vm.frames.len().checked_sub(1) else {
        // No frames left - nothing to do
        return;
    };

    // A fault ends the run; nothing on the stack gets to observe it
    if let Control::Fault(_) = vm.control {
        vm.frames.clear();
        return;
    }
    if let Err(fault) = rt.tick() {
        vm.control = Control::Fault(fault);
        vm.frames.clear();
        return;
    }

    // Clone frame data we need (to avoid borrow checker issues)
    let (kind, node) = {
        let f = &vm.frames[frame_idx];
        (f.kind.clone(), f.node.clone())
    };

    // Dispatch to statement handler
    match (kind, node.as_ref()) {
        (FrameKind::Return { .. }, Stmt::Return { value, span }) => {
            execute_return(vm, rt, value.as_ref(), *span)
        }

        (FrameKind::Throw { .. }, Stmt::Throw { value, span }) => {
            execute_throw(vm, rt, value, *span)
        }

        (FrameKind::Block { phase, idx, outer }, Stmt::Block { body, .. }) => {
            execute_block(vm, phase, idx, outer, body.as_slice())
        }

        (
            FrameKind::Try {
                phase,
                saved,
                outer,
            },
            Stmt::Try {
                body,
                catch,
                finally,
                ..
            },
        ) => execute_try(
            vm,
            rt,
            phase,
            saved,
            outer,
            body,
            catch.as_ref(),
            finally.as_deref(),
        ),

        (FrameKind::Expr { .. }, Stmt::Expr { expr, span }) => execute_expr(vm, rt, expr, *span),

        (
            FrameKind::Assign { .. },
            Stmt::Assign {
                var,
                path,
                value,
                span,
                ..
            },
        ) => execute_assign(vm, rt, var, path, value, *span),

        (
            FrameKind::If { .. },
            Stmt::If {
                test,
                then_s,
                else_s,
                span,
            },
        ) => execute_if(vm, rt, test, then_s, else_s.as_deref(), *span),

        (FrameKind::While { .. }, Stmt::While { test, body, span }) => {
            execute_while(vm, rt, test, body, *span)
        }

        (
            FrameKind::For { phase, outer },
            Stmt::For {
                init,
                test,
                update,
                body,
                span,
            },
        ) => execute_for(
            vm,
            rt,
            phase,
            outer,
            init.as_deref(),
            test.as_ref(),
            update.as_deref(),
            body,
            *span,
        ),

        (
            FrameKind::ForLoop {
                items, idx, outer, ..
            },
            Stmt::ForLoop {
                kind,
                var_kind,
                binding,
                iterable,
                body,
                span,
                ..
            },
        ) => execute_for_loop(
            vm, rt, items, idx, outer, *kind, *var_kind, binding, iterable, body, *span,
        ),

        (FrameKind::Break { .. }, Stmt::Break { .. }) => execute_break(vm),

        (FrameKind::Continue { .. }, Stmt::Continue { .. }) => execute_continue(vm),

        (
            FrameKind::Declare { .. },
            Stmt::Declare {
                var_kind,
                decls,
                span,
            },
        ) => execute_declare(vm, rt, *var_kind, decls, *span),

        (FrameKind::Function { .. }, Stmt::Function { def, .. }) => execute_function(vm, def),

        // Module items never reach a VM on their own
        (FrameKind::Function { .. }, _) => {
            vm.frames.pop();
        }

        // Frame kind does not match node
        (kind, stmt) => {
            vm.control = Control::Throw(Val::Error(ErrorInfo::new(
                errors::INTERNAL_ERROR,
                format!(
                    "Frame kind {:?} does not match statement at {:?}",
                    kind,
                    stmt.span()
                ),
            )));
            vm.frames.truncate(frame_idx);
        }
    }
}
