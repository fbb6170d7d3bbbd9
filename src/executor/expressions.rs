//! Expression evaluation
//!
//! Evaluates expressions to values. Expressions never touch the frame stack:
//! calls to dialect functions run their body on a nested VM.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::builtins::{self, call_builtin, get_index, get_property, property_key, to_string};
use super::errors::{self, ErrorInfo};
use super::exec_loop::run_until_done;
use super::types::ast::{BinaryOp, FunctionBody, ListItem, ObjProp, UnaryOp};
use super::types::{Closure, Control, DeclareTarget, Env, Expr, Fault, Stmt, Val, VarKind};
use super::vm::{Runtime, VM};

/// Result of evaluating an expression
///
/// Expression evaluation can either:
/// - Produce a value (normal case)
/// - Signal an error (throw)
/// - Abort the run (sandbox fault)
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    /// Expression evaluated to a value
    Value { v: Val },
    /// Expression evaluation failed (throw)
    Throw { error: Val },
    /// Sandbox fault; cannot be caught
    Fault { fault: Fault },
}

/// Abrupt completion of an expression, threaded through `?`
#[derive(Debug, Clone, PartialEq)]
pub enum Abrupt {
    Throw(Val),
    Fault(Fault),
}

impl From<ErrorInfo> for Abrupt {
    fn from(err: ErrorInfo) -> Self {
        Abrupt::Throw(Val::Error(err))
    }
}

impl From<Fault> for Abrupt {
    fn from(fault: Fault) -> Self {
        Abrupt::Fault(fault)
    }
}

impl From<Result<Val, Abrupt>> for EvalResult {
    fn from(result: Result<Val, Abrupt>) -> Self {
        match result {
            Ok(v) => EvalResult::Value { v },
            Err(Abrupt::Throw(error)) => EvalResult::Throw { error },
            Err(Abrupt::Fault(fault)) => EvalResult::Fault { fault },
        }
    }
}

/// Evaluate an expression to a value, error, or fault
///
/// Parameters:
/// - expr: The expression to evaluate
/// - env: The scope for identifier lookups
/// - rt: Shared runtime (resolver, limits, counters)
pub fn eval_expr(expr: &Expr, env: &Env, rt: &mut Runtime) -> EvalResult {
    eval(expr, env, rt).into()
}

pub(crate) fn eval(expr: &Expr, env: &Env, rt: &mut Runtime) -> Result<Val, Abrupt> {
    rt.enter_expr()?;
    let result = eval_nested(expr, env, rt);
    rt.leave_expr();
    result
}

fn eval_nested(expr: &Expr, env: &Env, rt: &mut Runtime) -> Result<Val, Abrupt> {
    match expr {
        Expr::LitBool { v, .. } => Ok(Val::Bool(*v)),

        Expr::LitNum { v, .. } => Ok(Val::Num(*v)),

        Expr::LitStr { v, .. } => Ok(Val::Str(v.clone())),

        Expr::LitNull { .. } => Ok(Val::Null),

        Expr::LitList { elements, .. } => {
            // Evaluate all elements (left to right)
            let mut vals = Vec::with_capacity(elements.len());
            for element in elements {
                match element {
                    ListItem::Item { expr } => vals.push(eval(expr, env, rt)?),
                    ListItem::Spread { expr } => match eval(expr, env, rt)? {
                        Val::List(items) => vals.extend(items.borrow().iter().cloned()),
                        Val::Str(s) => vals.extend(s.chars().map(|c| Val::Str(c.to_string()))),
                        other => {
                            return Err(ErrorInfo::type_error(format!(
                                "{} is not iterable",
                                to_string(&other)
                            ))
                            .into())
                        }
                    },
                }
            }
            Ok(Val::list(vals))
        }

        Expr::LitObj { properties, .. } => {
            let mut map = BTreeMap::new();
            for prop in properties {
                match prop {
                    ObjProp::KeyValue { key, value, .. } => {
                        map.insert(key.clone(), eval(value, env, rt)?);
                    }
                    ObjProp::Shorthand { name, .. } => {
                        map.insert(name.clone(), lookup(env, name)?);
                    }
                    ObjProp::Spread { expr } => {
                        let source = eval(expr, env, rt)?;
                        spread_into(&mut map, &source);
                    }
                }
            }
            Ok(Val::obj(map))
        }

        Expr::Template { quasis, exprs, .. } => {
            let mut out = String::new();
            for (idx, quasi) in quasis.iter().enumerate() {
                out.push_str(quasi);
                if let Some(expr) = exprs.get(idx) {
                    out.push_str(&to_string(&eval(expr, env, rt)?));
                }
            }
            builtins::check_string_length(out.len(), rt.limits.max_length)?;
            Ok(Val::Str(out))
        }

        Expr::Ident { name, .. } => lookup(env, name),

        Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => {
            // A short-circuited optional chain evaluates to undefined
            Ok(eval_chain(expr, env, rt)?.unwrap_or(Val::Undefined))
        }

        Expr::New { callee, args, .. } => {
            let ctor = eval(callee, env, rt)?;
            let args = eval_args(args, env, rt)?;
            match &ctor {
                Val::Func { func, .. } if func.error_code().is_some() => {
                    call_builtin(*func, &args, rt)
                }
                _ => Err(ErrorInfo::type_error(format!(
                    "{} is not a constructor",
                    describe(callee)
                ))
                .into()),
            }
        }

        Expr::Unary { op, operand, .. } => {
            // typeof tolerates undeclared identifiers
            if let (UnaryOp::TypeOf, Expr::Ident { name, .. }) = (op, operand.as_ref()) {
                return Ok(Val::str(env.get(name).map_or("undefined", |v| v.type_of())));
            }
            let v = eval(operand, env, rt)?;
            Ok(match op {
                UnaryOp::Not => Val::Bool(!v.is_truthy()),
                UnaryOp::Neg => Val::Num(-builtins::to_number(&v)),
                UnaryOp::Plus => Val::Num(builtins::to_number(&v)),
                UnaryOp::TypeOf => Val::str(v.type_of()),
            })
        }

        Expr::Arith { .. } => {
            // Left-nested chains (`a + b + c ...`) are folded iteratively
            let mut operands = Vec::new();
            let mut head = expr;
            while let Expr::Arith {
                op, left, right, ..
            } = head
            {
                operands.push((*op, right.as_ref()));
                head = left.as_ref();
            }

            let mut acc = eval(head, env, rt)?;
            for (op, right) in operands.into_iter().rev() {
                let r = eval(right, env, rt)?;
                acc = builtins::arith(op, &acc, &r);
                if let Val::Str(s) = &acc {
                    builtins::check_string_length(s.len(), rt.limits.max_length)?;
                }
            }
            Ok(acc)
        }

        Expr::BinaryOp {
            op, left, right, ..
        } => {
            let l = eval(left, env, rt)?;

            // Short-circuit: the right side is only evaluated when needed
            let take_left = match op {
                BinaryOp::And => !l.is_truthy(),
                BinaryOp::Or => l.is_truthy(),
                BinaryOp::Nullish => !l.is_nullish(),
            };
            if take_left {
                Ok(l)
            } else {
                eval(right, env, rt)
            }
        }

        Expr::Ternary {
            condition,
            consequent,
            alternate,
            ..
        } => {
            if eval(condition, env, rt)?.is_truthy() {
                eval(consequent, env, rt)
            } else {
                eval(alternate, env, rt)
            }
        }

        Expr::Function { def, .. } => Ok(Val::Closure(Closure {
            def: Rc::clone(def),
            env: env.clone(),
        })),

        Expr::Jsx { .. } => Err(ErrorInfo::new(errors::SYNTAX_ERROR, "Unexpected token '<'").into()),
    }
}

/// Evaluate a member/index/call chain
///
/// Returns `None` when an optional link (`?.`) met `null`/`undefined`; the
/// rest of the chain is skipped.
fn eval_chain(expr: &Expr, env: &Env, rt: &mut Runtime) -> Result<Option<Val>, Abrupt> {
    rt.enter_expr()?;
    let result = eval_link(expr, env, rt);
    rt.leave_expr();
    result
}

fn eval_link(expr: &Expr, env: &Env, rt: &mut Runtime) -> Result<Option<Val>, Abrupt> {
    match expr {
        Expr::Member {
            object,
            property,
            optional,
            ..
        } => {
            let Some(obj) = eval_chain(object, env, rt)? else {
                return Ok(None);
            };
            if *optional && obj.is_nullish() {
                return Ok(None);
            }
            Ok(Some(get_property(&obj, property)?))
        }

        Expr::Index {
            object,
            index,
            optional,
            ..
        } => {
            let Some(obj) = eval_chain(object, env, rt)? else {
                return Ok(None);
            };
            if *optional && obj.is_nullish() {
                return Ok(None);
            }
            let key = eval(index, env, rt)?;
            Ok(Some(get_index(&obj, &key)?))
        }

        Expr::Call {
            callee,
            args,
            optional,
            ..
        } => {
            let Some(func) = eval_chain(callee, env, rt)? else {
                return Ok(None);
            };
            if *optional && func.is_nullish() {
                return Ok(None);
            }
            let args = eval_args(args, env, rt)?;
            Ok(Some(call_value(&func, args, rt, &describe(callee))?))
        }

        _ => eval(expr, env, rt).map(Some),
    }
}

fn eval_args(args: &[Expr], env: &Env, rt: &mut Runtime) -> Result<Vec<Val>, Abrupt> {
    args.iter().map(|arg| eval(arg, env, rt)).collect()
}

fn lookup(env: &Env, name: &str) -> Result<Val, Abrupt> {
    env.get(name)
        .ok_or_else(|| ErrorInfo::reference_error(format!("{} is not defined", name)).into())
}

/// Copy enumerable entries of `source` into an object literal under construction
fn spread_into(map: &mut BTreeMap<String, Val>, source: &Val) {
    match source {
        Val::Obj(other) => {
            for (k, v) in other.borrow().iter() {
                map.insert(k.clone(), v.clone());
            }
        }
        Val::List(items) => {
            for (i, v) in items.borrow().iter().enumerate() {
                map.insert(i.to_string(), v.clone());
            }
        }
        Val::Str(s) => {
            for (i, c) in s.chars().enumerate() {
                map.insert(i.to_string(), Val::Str(c.to_string()));
            }
        }
        _ => {}
    }
}

/// Source-like rendering of a callee for error messages
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident { name, .. } => name.clone(),
        Expr::Member {
            object, property, ..
        } => format!("{}.{}", describe(object), property),
        Expr::Index { object, .. } => format!("{}[...]", describe(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

/* ===================== Calls ===================== */

/// Call any callable value
pub fn call_value(
    func: &Val,
    args: Vec<Val>,
    rt: &mut Runtime,
    callee: &str,
) -> Result<Val, Abrupt> {
    match func {
        Val::Func { func, bindings } => {
            // Bound receiver comes first
            let mut all = bindings.clone();
            all.extend(args);
            call_builtin(*func, &all, rt)
        }
        Val::Closure(closure) => call_closure(closure, args, rt),
        Val::Native(native) => {
            rt.tick()?;
            Ok(native.call(&args)?)
        }
        _ => Err(ErrorInfo::type_error(format!("{} is not a function", callee)).into()),
    }
}

/// Run a dialect function
fn call_closure(closure: &Closure, args: Vec<Val>, rt: &mut Runtime) -> Result<Val, Abrupt> {
    if rt.depth >= rt.limits.max_call_depth {
        return Err(Fault::CallDepth {
            limit: rt.limits.max_call_depth,
        }
        .into());
    }
    rt.tick()?;

    let def = &closure.def;
    let scope = closure.env.child();

    // Named function expressions can refer to themselves
    if let (Some(name), super::types::ast::FunctionKind::Expression) = (&def.name, def.kind) {
        scope.declare(name.clone(), Val::Closure(closure.clone()), VarKind::Let);
    }

    let mut args = args.into_iter();
    for param in &def.params {
        let mut value = args.next().unwrap_or(Val::Undefined);
        if matches!(value, Val::Undefined) {
            if let Some(default) = &param.default {
                value = eval(default, &scope, rt)?;
            }
        }
        bind_target(&param.target, value, &scope, VarKind::Let, rt)?;
    }

    match &def.body {
        FunctionBody::Expr { expr } => {
            rt.depth += 1;
            let result = eval(expr, &scope, rt);
            rt.depth -= 1;
            result
        }
        FunctionBody::Block { body } => {
            rt.depth += 1;
            let mut vm = VM::new(Stmt::clone(body), scope);
            run_until_done(&mut vm, rt);
            rt.depth -= 1;

            match vm.control {
                Control::Return(v) => Ok(v),
                Control::Throw(error) => Err(Abrupt::Throw(error)),
                Control::Fault(fault) => Err(Abrupt::Fault(fault)),
                // break/continue cannot escape a function body
                Control::None | Control::Break(_) | Control::Continue(_) => Ok(Val::Undefined),
            }
        }
    }
}

/* ===================== Bindings ===================== */

/// Bind a declaration target (simple name or destructure pattern) in `env`
pub(crate) fn bind_target(
    target: &DeclareTarget,
    value: Val,
    env: &Env,
    kind: VarKind,
    rt: &mut Runtime,
) -> Result<(), Abrupt> {
    match target {
        DeclareTarget::Simple { name, .. } => {
            env.declare(name.clone(), value, kind);
            Ok(())
        }
        DeclareTarget::Destructure { fields, .. } => {
            if value.is_nullish() {
                let shown = to_string(&value);
                return Err(ErrorInfo::type_error(format!(
                    "Cannot destructure '{}' as it is {}.",
                    shown, shown
                ))
                .into());
            }
            for field in fields {
                let mut v = get_property(&value, &field.key)?;
                if matches!(v, Val::Undefined) {
                    if let Some(default) = &field.default {
                        v = eval(default, env, rt)?;
                    }
                }
                env.declare(field.local.clone(), v, kind);
            }
            Ok(())
        }
    }
}

/// Property key for an evaluated index expression
pub(crate) fn key_of(index: &Val) -> String {
    property_key(index)
}
