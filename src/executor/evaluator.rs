//! Sandboxed evaluation of target code
//!
//! Runs transformed code with nothing in scope but the language intrinsics,
//! `require` (backed by a [`Resolve`]) and a fresh `exports` object, then
//! turns whatever the program ended in into a result value or a
//! [`TranspileError`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::builtins::{intrinsics, to_string, Builtin};
use super::errors::{ErrorInfo, RANGE_ERROR, SYNTAX_ERROR};
use super::exec_loop::run_until_done;
use super::json::val_to_display_json;
use super::types::visit::{walk_stmt, Visitor};
use super::types::{Control, Env, Fault, Span, Stmt, Val, VarKind};
use super::vm::{Limits, Runtime, VM};
use crate::error::{Location, RuntimeError, TranspileError, UnresolvedImportError};
use crate::parser::parse_module;
use crate::sandbox::Resolve;
use crate::transform::gate::{self, Syntax};
use crate::transform::source_map::SourceMap;
use crate::transform::TargetCode;

/// Runs target code and produces its result value
pub trait Executor {
    /// `original_source` is only used to decide whether the inline source
    /// map belongs to it, so runtime errors can point at source positions.
    fn execute(
        &self,
        code: &TargetCode,
        resolver: &dyn Resolve,
        original_source: &str,
    ) -> Result<Val, TranspileError>;
}

/// Which value a successful run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    /// `exports.default` if assigned, else `exports` if anything was
    /// exported, else the completion value
    #[default]
    Exports,
    /// The value of the last expression statement
    Completion,
}

/// The sandboxed [`Executor`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxEvaluator {
    pub limits: Limits,
    pub result_mode: ResultMode,
}

impl SandboxEvaluator {
    pub fn new(limits: Limits, result_mode: ResultMode) -> Self {
        Self {
            limits,
            result_mode,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_result_mode(mut self, result_mode: ResultMode) -> Self {
        self.result_mode = result_mode;
        self
    }
}

impl Executor for SandboxEvaluator {
    fn execute(
        &self,
        code: &TargetCode,
        resolver: &dyn Resolve,
        original_source: &str,
    ) -> Result<Val, TranspileError> {
        let locator = Locator::new(code, original_source);

        let module = parse_module(code.as_str())
            .map_err(|err| locator.syntax_error(err.message(), err.span()))?;
        if let Some((message, span)) = unrunnable(&module.body) {
            return Err(locator.syntax_error(message, Some(span)));
        }
        if let Some(span) = gate::first_use(&module, Syntax::Jsx) {
            return Err(locator.syntax_error("Unexpected token '<'", Some(span)));
        }

        let env = module_env();
        let program = Stmt::Block {
            body: module.body,
            span: module.span,
        };

        let mut rt = Runtime::new(resolver, self.limits);
        let mut vm = VM::new(program, env.clone());
        run_until_done(&mut vm, &mut rt);
        debug!(steps = rt.steps, "Evaluation finished");

        match vm.control {
            Control::Throw(payload) => {
                let message = describe(&payload);
                let trace = locator.trace(&rt.trace);
                Err(RuntimeError::new(payload, message).with_trace(trace).into())
            }
            Control::Fault(fault) => Err(fault_error(fault)),
            Control::Return(value) => Ok(self.result(&env, Some(value))),
            Control::None | Control::Break(_) | Control::Continue(_) => {
                Ok(self.result(&env, vm.completion))
            }
        }
    }
}

impl SandboxEvaluator {
    fn result(&self, env: &Env, completion: Option<Val>) -> Val {
        let completion = completion.unwrap_or(Val::Null);
        if self.result_mode == ResultMode::Completion {
            return completion;
        }

        match env.get("exports") {
            Some(Val::Obj(map)) => {
                let fields = map.borrow();
                if let Some(default) = fields.get("default") {
                    return default.clone();
                }
                if fields.is_empty() {
                    return completion;
                }
                drop(fields);
                Val::Obj(map)
            }
            // Reassigned wholesale
            Some(other) => other,
            None => completion,
        }
    }
}

/* ===================== Environment ===================== */

/// Intrinsics at the root, `require` and `exports` one scope down
fn module_env() -> Env {
    let root = Env::root();
    for (name, value) in intrinsics() {
        root.declare(name, value, VarKind::Const);
    }

    let env = root.child();
    env.declare(
        "require",
        Val::Func {
            func: Builtin::Require,
            bindings: vec![],
        },
        VarKind::Const,
    );
    env.declare("exports", Val::empty_obj(), VarKind::Var);
    env
}

/* ===================== Pre-flight ===================== */

/// Module syntax the evaluator cannot run, with its message
fn unrunnable(body: &[Stmt]) -> Option<(&'static str, Span)> {
    let mut finder = ModuleItemFinder::default();
    for stmt in body {
        finder.visit_stmt(stmt);
    }
    finder.found
}

#[derive(Default)]
struct ModuleItemFinder {
    found: Option<(&'static str, Span)>,
}

impl Visitor for ModuleItemFinder {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if self.found.is_some() {
            return;
        }
        match stmt {
            Stmt::Import { span, .. } => {
                self.found = Some(("Cannot use import statement outside a module", *span))
            }
            Stmt::ExportDefault { span, .. }
            | Stmt::ExportDecl { span, .. }
            | Stmt::ExportNamed { span, .. } => {
                self.found = Some(("Unexpected token 'export'", *span))
            }
            _ => walk_stmt(self, stmt),
        }
    }
}

/* ===================== Outcome Mapping ===================== */

fn describe(payload: &Val) -> String {
    match payload {
        Val::Error(info) => info.to_string(),
        Val::Str(s) => s.clone(),
        Val::List(_) | Val::Obj(_) => val_to_display_json(payload)
            .map(|json| json.to_string())
            .unwrap_or_else(|_| to_string(payload)),
        other => to_string(other),
    }
}

fn fault_error(fault: Fault) -> TranspileError {
    let info = match fault {
        Fault::UnresolvedImport { specifier } => {
            return UnresolvedImportError::new(specifier).into();
        }
        Fault::StepLimit { limit } => ErrorInfo::new(
            RANGE_ERROR,
            format!("Execution step limit exceeded ({} steps)", limit),
        ),
        Fault::CallDepth { .. } | Fault::ExprDepth { .. } => {
            ErrorInfo::new(RANGE_ERROR, "Maximum call stack size exceeded")
        }
    };
    let message = info.to_string();
    RuntimeError::new(info.into_val(), message).into()
}

/// Maps target positions back to the source when the inline map belongs to it
struct Locator {
    map: Option<SourceMap>,
}

impl Locator {
    fn new(code: &TargetCode, original_source: &str) -> Self {
        Self {
            map: code
                .source_map()
                .filter(|map| map.matches(original_source)),
        }
    }

    fn locate(&self, span: &Span) -> Location {
        self.map
            .as_ref()
            .and_then(|map| map.lookup(span.start_line, span.start_col))
            .unwrap_or_else(|| Location::from_span(span))
    }

    fn trace(&self, spans: &[Span]) -> Vec<Location> {
        let mut trace: Vec<Location> = spans.iter().map(|span| self.locate(span)).collect();
        trace.dedup();
        trace
    }

    fn syntax_error(&self, message: impl Into<String>, span: Option<Span>) -> TranspileError {
        let info = ErrorInfo::new(SYNTAX_ERROR, message);
        let message = info.to_string();
        let trace = span.iter().map(|span| self.locate(span)).collect();
        RuntimeError::new(info.into_val(), message)
            .with_trace(trace)
            .into()
    }
}
