//! Statement execution handlers
//!
//! Each statement type has its own handler function that processes
//! the statement based on its current execution phase.
//!
//! Handlers that open a scope (block, loops, catch) restore the outer scope
//! before popping, whether they finish normally or while control flow is
//! unwinding through them.

use std::rc::Rc;

use super::builtins::{get_property, set_property, to_string};
use super::errors::ErrorInfo;
use super::expressions::{bind_target, eval, key_of, Abrupt};
use super::types::ast::{CatchClause, Declarator};
use super::types::{
    BlockPhase, Closure, Control, DeclareTarget, Env, Expr, ForLoopKind, ForPhase, FrameKind,
    FunctionDef, MemberAccess, Span, Stmt, TryPhase, Val, VarKind,
};
use super::vm::{push_stmt, Runtime, VM};

/* ===================== Helpers ===================== */

/// Record an abrupt completion produced while running the statement at `span`
///
/// Throws remember the statement span for the runtime trace; faults carry
/// none. Callers either pop their frame or leave it to clean up on the next
/// step.
fn raise(vm: &mut VM, rt: &mut Runtime, abrupt: Abrupt, span: Span) {
    match abrupt {
        Abrupt::Throw(error) => {
            if !span.is_synthetic() {
                rt.trace.push(span);
            }
            vm.control = Control::Throw(error);
        }
        Abrupt::Fault(fault) => vm.control = Control::Fault(fault),
    }
}

fn set_kind(vm: &mut VM, kind: FrameKind) {
    let frame_idx = vm.frames.len() - 1;
    vm.frames[frame_idx].kind = kind;
}

fn restore(vm: &mut VM, outer: Option<Env>) {
    if let Some(outer) = outer {
        vm.env = outer;
    }
}

fn closure_for(def: &Rc<FunctionDef>, env: &Env) -> Val {
    Val::Closure(Closure {
        def: Rc::clone(def),
        env: env.clone(),
    })
}

/// Bind function declarations at the top of a statement list
fn hoist_functions(body: &[Stmt], env: &Env) {
    for stmt in body {
        if let Stmt::Function { def, .. } = stmt {
            if let Some(name) = &def.name {
                env.declare(name.clone(), closure_for(def, env), VarKind::Let);
            }
        }
    }
}

/* ===================== Statement Handlers ===================== */

/// Execute Block statement
pub fn execute_block(
    vm: &mut VM,
    phase: BlockPhase,
    idx: usize,
    outer: Option<Env>,
    body: &[Stmt],
) {
    // If control flow is active, clean up and pop
    if vm.control != Control::None {
        restore(vm, outer);
        vm.frames.pop();
        return;
    }

    let outer = match phase {
        BlockPhase::Enter => {
            let outer = vm.env.clone();
            vm.env = outer.child();
            hoist_functions(body, &vm.env);
            Some(outer)
        }
        BlockPhase::Execute => outer,
    };

    // Check if we've finished all statements in the block
    let Some(child_stmt) = body.get(idx) else {
        restore(vm, outer);
        vm.frames.pop();
        return;
    };

    // Update our frame to point to the next statement
    set_kind(
        vm,
        FrameKind::Block {
            phase: BlockPhase::Execute,
            idx: idx + 1,
            outer,
        },
    );

    // Push a frame for the child statement
    push_stmt(vm, child_stmt);
}

/// Execute Return statement
pub fn execute_return(vm: &mut VM, rt: &mut Runtime, value: Option<&Expr>, span: Span) {
    let val = match value {
        Some(expr) => match eval(expr, &vm.env, rt) {
            Ok(v) => v,
            Err(abrupt) => {
                raise(vm, rt, abrupt, span);
                vm.frames.pop();
                return;
            }
        },
        None => Val::Undefined,
    };

    vm.control = Control::Return(val);
    vm.frames.pop();
}

/// Execute Throw statement
pub fn execute_throw(vm: &mut VM, rt: &mut Runtime, value: &Expr, span: Span) {
    let abrupt = match eval(value, &vm.env, rt) {
        Ok(error) => Abrupt::Throw(error),
        Err(abrupt) => abrupt,
    };
    raise(vm, rt, abrupt, span);
    vm.frames.pop();
}

/// Execute Try statement
///
/// Sandbox faults pass straight through: neither catch nor finally runs.
#[allow(clippy::too_many_arguments)]
pub fn execute_try(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: TryPhase,
    saved: Option<Box<Control>>,
    outer: Option<Env>,
    body: &Stmt,
    catch: Option<&CatchClause>,
    finally: Option<&Stmt>,
) {
    if let Control::Fault(_) = vm.control {
        restore(vm, outer);
        vm.frames.pop();
        return;
    }

    // Error raised in the try body: hand it to the catch clause
    if let (TryPhase::TryStarted, Control::Throw(error), Some(clause)) =
        (phase, &vm.control, catch)
    {
        let error = error.clone();
        vm.control = Control::None;
        rt.trace.clear();

        let outer_env = vm.env.clone();
        vm.env = outer_env.child();
        if let Some(var) = &clause.var {
            vm.env.declare(var.clone(), error, VarKind::Let);
        }

        set_kind(
            vm,
            FrameKind::Try {
                phase: TryPhase::CatchStarted,
                saved: None,
                outer: Some(outer_env),
            },
        );
        push_stmt(vm, &clause.body);
        return;
    }

    // Any other abrupt completion: run finally with the control parked
    if vm.control != Control::None {
        restore(vm, outer);
        match (phase, finally) {
            (TryPhase::TryStarted | TryPhase::CatchStarted, Some(finally)) => {
                let parked = std::mem::replace(&mut vm.control, Control::None);
                set_kind(
                    vm,
                    FrameKind::Try {
                        phase: TryPhase::FinallyStarted,
                        saved: Some(Box::new(parked)),
                        outer: None,
                    },
                );
                push_stmt(vm, finally);
            }
            // Control raised inside finally replaces whatever was parked
            _ => {
                vm.frames.pop();
            }
        }
        return;
    }

    match phase {
        TryPhase::NotStarted => {
            set_kind(
                vm,
                FrameKind::Try {
                    phase: TryPhase::TryStarted,
                    saved: None,
                    outer: None,
                },
            );
            push_stmt(vm, body);
        }
        TryPhase::TryStarted | TryPhase::CatchStarted => {
            restore(vm, outer);
            match finally {
                Some(finally) => {
                    set_kind(
                        vm,
                        FrameKind::Try {
                            phase: TryPhase::FinallyStarted,
                            saved: None,
                            outer: None,
                        },
                    );
                    push_stmt(vm, finally);
                }
                None => {
                    vm.frames.pop();
                }
            }
        }
        TryPhase::FinallyStarted => {
            if let Some(saved) = saved {
                vm.control = *saved;
            }
            vm.frames.pop();
        }
    }
}

/// Execute Expr statement
pub fn execute_expr(vm: &mut VM, rt: &mut Runtime, expr: &Expr, span: Span) {
    match eval(expr, &vm.env, rt) {
        Ok(v) => vm.completion = Some(v),
        Err(abrupt) => raise(vm, rt, abrupt, span),
    }
    vm.frames.pop();
}

/// Execute Assign statement
///
/// Handles both simple variable assignment and member paths:
/// - `x = value`
/// - `obj.prop = value`
/// - `arr[i].field = value`
pub fn execute_assign(
    vm: &mut VM,
    rt: &mut Runtime,
    var: &str,
    path: &[MemberAccess],
    value: &Expr,
    span: Span,
) {
    if let Err(abrupt) = assign(vm, rt, var, path, value) {
        raise(vm, rt, abrupt, span);
    }
    vm.frames.pop();
}

fn assign(
    vm: &mut VM,
    rt: &mut Runtime,
    var: &str,
    path: &[MemberAccess],
    value: &Expr,
) -> Result<(), Abrupt> {
    if path.is_empty() {
        let v = eval(value, &vm.env, rt)?;
        vm.env.assign(var, v)?;
        return Ok(());
    }

    let base = vm
        .env
        .get(var)
        .ok_or_else(|| ErrorInfo::reference_error(format!("{} is not defined", var)))?;

    // Resolve every key before the right-hand side runs
    let mut keys = Vec::with_capacity(path.len());
    for segment in path {
        keys.push(match segment {
            MemberAccess::Prop { property, .. } => property.clone(),
            MemberAccess::Index { expr, .. } => key_of(&eval(expr, &vm.env, rt)?),
        });
    }
    let last_key = keys.pop().unwrap_or_default();

    let mut target = base;
    for key in &keys {
        target = get_property(&target, key)?;
    }

    let v = eval(value, &vm.env, rt)?;
    set_property(&target, &last_key, v, rt.limits.max_length)?;
    Ok(())
}

/// Execute If statement
pub fn execute_if(
    vm: &mut VM,
    rt: &mut Runtime,
    test: &Expr,
    then_s: &Stmt,
    else_s: Option<&Stmt>,
    span: Span,
) {
    let test_val = match eval(test, &vm.env, rt) {
        Ok(v) => v,
        Err(abrupt) => {
            raise(vm, rt, abrupt, span);
            vm.frames.pop();
            return;
        }
    };

    // Pop the If frame before pushing the branch
    vm.frames.pop();

    if test_val.is_truthy() {
        push_stmt(vm, then_s);
    } else if let Some(else_stmt) = else_s {
        push_stmt(vm, else_stmt);
    }
}

/// Execute While statement
pub fn execute_while(vm: &mut VM, rt: &mut Runtime, test: &Expr, body: &Stmt, span: Span) {
    match vm.control {
        Control::Break(_) => {
            vm.control = Control::None;
            vm.frames.pop();
            return;
        }
        Control::Continue(_) => {
            // Fall through to re-evaluate the test
            vm.control = Control::None;
        }
        Control::None => {}
        _ => {
            vm.frames.pop();
            return;
        }
    }

    match eval(test, &vm.env, rt) {
        Ok(v) if v.is_truthy() => push_stmt(vm, body),
        Ok(_) => {
            vm.frames.pop();
        }
        Err(abrupt) => {
            raise(vm, rt, abrupt, span);
            vm.frames.pop();
        }
    }
}

/// Execute C-style For statement
#[allow(clippy::too_many_arguments)]
pub fn execute_for(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: ForPhase,
    outer: Option<Env>,
    init: Option<&Stmt>,
    test: Option<&Expr>,
    update: Option<&Stmt>,
    body: &Stmt,
    span: Span,
) {
    let mut phase = phase;
    match vm.control {
        Control::Continue(_) => vm.control = Control::None,
        Control::Break(_) => {
            vm.control = Control::None;
            restore(vm, outer);
            vm.frames.pop();
            return;
        }
        Control::None => {}
        _ => {
            restore(vm, outer);
            vm.frames.pop();
            return;
        }
    }

    if phase == ForPhase::Update && update.is_none() {
        phase = ForPhase::Test;
    }

    match phase {
        ForPhase::Init => {
            let outer_env = vm.env.clone();
            vm.env = outer_env.child();
            set_kind(
                vm,
                FrameKind::For {
                    phase: ForPhase::Test,
                    outer: Some(outer_env),
                },
            );
            if let Some(init) = init {
                push_stmt(vm, init);
            }
        }
        ForPhase::Test => {
            let proceed = match test {
                None => true,
                Some(test) => match eval(test, &vm.env, rt) {
                    Ok(v) => v.is_truthy(),
                    Err(abrupt) => {
                        // Cleanup happens on the next step
                        raise(vm, rt, abrupt, span);
                        return;
                    }
                },
            };
            if proceed {
                set_kind(
                    vm,
                    FrameKind::For {
                        phase: ForPhase::Update,
                        outer,
                    },
                );
                push_stmt(vm, body);
            } else {
                restore(vm, outer);
                vm.frames.pop();
            }
        }
        ForPhase::Update => {
            set_kind(
                vm,
                FrameKind::For {
                    phase: ForPhase::Test,
                    outer,
                },
            );
            if let Some(update) = update {
                push_stmt(vm, update);
            }
        }
    }
}

/// Execute ForLoop statement (for...in / for...of)
///
/// Each iteration gets a fresh scope, so closures created in the body see
/// their own binding.
#[allow(clippy::too_many_arguments)]
pub fn execute_for_loop(
    vm: &mut VM,
    rt: &mut Runtime,
    items: Option<Rc<Vec<Val>>>,
    idx: usize,
    outer: Option<Env>,
    kind: ForLoopKind,
    var_kind: VarKind,
    binding: &str,
    iterable: &Expr,
    body: &Stmt,
    span: Span,
) {
    match vm.control {
        Control::Continue(_) => vm.control = Control::None,
        Control::Break(_) => {
            vm.control = Control::None;
            restore(vm, outer);
            vm.frames.pop();
            return;
        }
        Control::None => {}
        _ => {
            restore(vm, outer);
            vm.frames.pop();
            return;
        }
    }

    // First time: evaluate the iterable and snapshot its items
    let (items, outer) = match items {
        Some(items) => (items, outer),
        None => match eval(iterable, &vm.env, rt).and_then(|v| iteration_items(kind, &v)) {
            Ok(items) => (Rc::new(items), Some(vm.env.clone())),
            Err(abrupt) => {
                raise(vm, rt, abrupt, span);
                vm.frames.pop();
                return;
            }
        },
    };

    let Some(item) = items.get(idx).cloned() else {
        restore(vm, outer);
        vm.frames.pop();
        return;
    };

    let loop_env = match &outer {
        Some(env) => env.child(),
        None => vm.env.child(),
    };
    loop_env.declare(binding.to_string(), item, var_kind);
    vm.env = loop_env;

    set_kind(
        vm,
        FrameKind::ForLoop {
            phase: super::types::ForLoopPhase::Iterate,
            items: Some(items),
            idx: idx + 1,
            outer,
        },
    );
    push_stmt(vm, body);
}

fn iteration_items(kind: ForLoopKind, value: &Val) -> Result<Vec<Val>, Abrupt> {
    match (kind, value) {
        (ForLoopKind::Of, Val::List(items)) => Ok(items.borrow().clone()),
        (ForLoopKind::Of, Val::Str(s)) => Ok(s.chars().map(|c| Val::Str(c.to_string())).collect()),
        (ForLoopKind::Of, other) => Err(ErrorInfo::type_error(format!(
            "{} is not iterable",
            to_string(other)
        ))
        .into()),
        (ForLoopKind::In, Val::Obj(map)) => {
            Ok(map.borrow().keys().map(|k| Val::Str(k.clone())).collect())
        }
        (ForLoopKind::In, Val::List(items)) => Ok((0..items.borrow().len())
            .map(|i| Val::Str(i.to_string()))
            .collect()),
        (ForLoopKind::In, Val::Str(s)) => Ok((0..s.chars().count())
            .map(|i| Val::Str(i.to_string()))
            .collect()),
        // for...in over anything else runs zero times
        (ForLoopKind::In, _) => Ok(vec![]),
    }
}

/// Execute Break statement
pub fn execute_break(vm: &mut VM) {
    vm.control = Control::Break(None);
    vm.frames.pop();
}

/// Execute Continue statement
pub fn execute_continue(vm: &mut VM) {
    vm.control = Control::Continue(None);
    vm.frames.pop();
}

/// Execute Declare statement (let/const/var)
pub fn execute_declare(
    vm: &mut VM,
    rt: &mut Runtime,
    var_kind: VarKind,
    decls: &[Declarator],
    span: Span,
) {
    for decl in decls {
        let result = match &decl.init {
            Some(init) => eval(init, &vm.env, rt),
            // `var x;` keeps an existing binding
            None if var_kind == VarKind::Var => Ok(match &decl.target {
                DeclareTarget::Simple { name, .. } => vm.env.get(name).unwrap_or(Val::Undefined),
                DeclareTarget::Destructure { .. } => Val::Undefined,
            }),
            None => Ok(Val::Undefined),
        };
        let env = vm.env.clone();
        if let Err(abrupt) =
            result.and_then(|value| bind_target(&decl.target, value, &env, var_kind, rt))
        {
            raise(vm, rt, abrupt, span);
            break;
        }
    }
    vm.frames.pop();
}

/// Execute a function declaration
///
/// Declarations are hoisted by the enclosing block; this only binds ones that
/// appear outside a block (e.g. as an `if` branch).
pub fn execute_function(vm: &mut VM, def: &Rc<FunctionDef>) {
    if let Some(name) = &def.name {
        if !vm.env.has_own(name) {
            let closure = closure_for(def, &vm.env);
            vm.env.declare(name.clone(), closure, VarKind::Let);
        }
    }
    vm.frames.pop();
}
