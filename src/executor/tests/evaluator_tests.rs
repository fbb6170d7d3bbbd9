//! Tests for the sandboxed evaluator: result selection and outcome mapping

use maplit::btreemap;

use crate::error::{Location, RuntimeError, TranspileError, UnresolvedImportError};
use crate::executor::{Executor, Limits, ResultMode, SandboxEvaluator, Val};
use crate::sandbox::{SandboxResolver, ScopeMapping};
use crate::transform::{transform, TargetCode, TransformConfig};

fn execute(source: &str, scope: &ScopeMapping) -> Result<Val, TranspileError> {
    execute_with(SandboxEvaluator::default(), source, scope)
}

fn execute_with(
    evaluator: SandboxEvaluator,
    source: &str,
    scope: &ScopeMapping,
) -> Result<Val, TranspileError> {
    let target = transform(source, &TransformConfig::default()).expect("Transform failed");
    evaluator.execute(&target, &SandboxResolver::new(scope), source)
}

fn runtime_error(result: Result<Val, TranspileError>) -> RuntimeError {
    let Err(TranspileError::Runtime(err)) = result else {
        unreachable!("Expected runtime error, got {:?}", result);
    };
    err
}

/* ===================== Results ===================== */

#[test]
fn test_default_export_is_the_result() {
    assert_eq!(
        execute("export default 1 + 1", &ScopeMapping::new()),
        Ok(Val::Num(2.0))
    );
}

#[test]
fn test_named_exports_give_the_exports_object() {
    let result = execute("export const a = 1\nexport function b() {}", &ScopeMapping::new());
    let Ok(Val::Obj(exports)) = result else {
        unreachable!("Expected exports object, got {:?}", result);
    };
    let exports = exports.borrow();
    assert_eq!(exports.get("a"), Some(&Val::Num(1.0)));
    assert!(exports.get("b").is_some_and(Val::is_callable));
}

#[test]
fn test_exports_see_final_binding_values() {
    let source = r#"
        export let count = 0
        count += 5
    "#;
    let result = execute(source, &ScopeMapping::new());
    let Ok(Val::Obj(exports)) = result else {
        unreachable!("Expected exports object, got {:?}", result);
    };
    assert_eq!(exports.borrow().get("count"), Some(&Val::Num(5.0)));
}

#[test]
fn test_without_exports_the_completion_value_is_used() {
    assert_eq!(
        execute("const a = 20\na + 1", &ScopeMapping::new()),
        Ok(Val::Num(21.0))
    );
    assert_eq!(execute("const a = 20", &ScopeMapping::new()), Ok(Val::Null));
}

#[test]
fn test_completion_mode_ignores_exports() {
    let evaluator = SandboxEvaluator::default().with_result_mode(ResultMode::Completion);
    assert_eq!(
        execute_with(evaluator, "export default 1\n\"last\"", &ScopeMapping::new()),
        Ok(Val::str("last"))
    );
}

#[test]
fn test_imports_resolve_through_scope() {
    let scope = ScopeMapping::new().with(
        "bar",
        Val::obj(btreemap! { "Foo".to_string() => Val::Num(42.0) }),
    );
    assert_eq!(
        execute("import { Foo } from \"bar\"; export default Foo;", &scope),
        Ok(Val::Num(42.0))
    );
}

#[test]
fn test_default_import_falls_back_to_module_value() {
    let scope = ScopeMapping::new().with("greeting", "hello");
    assert_eq!(
        execute("import g from \"greeting\"\nexport default g", &scope),
        Ok(Val::str("hello"))
    );
}

#[test]
fn test_jsx_runs_against_scoped_react() {
    let create_element = crate::executor::NativeFn::new("createElement", |args| {
        Ok(Val::list(args.to_vec()))
    });
    let react = Val::obj(btreemap! {
        "createElement".to_string() => Val::Native(create_element),
    });
    let scope = ScopeMapping::new().with("react", react);

    let source = "import React from \"react\"\nexport default <b>{1 + 1}</b>";
    assert_eq!(
        execute(source, &scope),
        Ok(Val::list(vec![Val::str("b"), Val::Null, Val::Num(2.0)]))
    );
}

/* ===================== Failures ===================== */

#[test]
fn test_missing_import_is_an_unresolved_import_error() {
    assert_eq!(
        execute("import { Foo } from \"bar\"; export default Foo;", &ScopeMapping::new()),
        Err(UnresolvedImportError::new("bar").into())
    );
}

#[test]
fn test_thrown_error_keeps_payload_and_source_trace() {
    let source = "function f() {\n  throw new Error(\"x\")\n}\n\nexport default f()";
    let err = runtime_error(execute(source, &ScopeMapping::new()));

    assert_eq!(err.message, "Error: x");
    assert!(matches!(&err.payload, Val::Error(info) if info.message == "x"));
    let lines: Vec<usize> = err.trace.iter().map(|loc| loc.line).collect();
    assert_eq!(lines, vec![2, 5]);
    assert_eq!(err.location.map(|loc| loc.line), Some(2));
}

#[test]
fn test_thrown_plain_value() {
    let err = runtime_error(execute("throw \"nope\"", &ScopeMapping::new()));
    assert_eq!(err.payload, Val::str("nope"));
    assert_eq!(err.message, "nope");
    assert_eq!(err.location, Some(Location::new(1, 1)));
}

#[test]
fn test_step_limit_is_a_runtime_error() {
    let evaluator = SandboxEvaluator::default().with_limits(Limits {
        max_steps: 500,
        ..Limits::default()
    });
    let err = runtime_error(execute_with(evaluator, "while (true) {}", &ScopeMapping::new()));
    assert_eq!(
        err.message,
        "RangeError: Execution step limit exceeded (500 steps)"
    );
}

#[test]
fn test_deep_nesting_reports_stack_overflow() {
    let evaluator = SandboxEvaluator::default().with_limits(Limits {
        max_expr_depth: 16,
        ..Limits::default()
    });
    let source = format!("export default {}0{}", "[".repeat(32), "]".repeat(32));
    let err = runtime_error(execute_with(evaluator, &source, &ScopeMapping::new()));
    assert_eq!(err.message, "RangeError: Maximum call stack size exceeded");
}

#[test]
fn test_leftover_import_cannot_run() {
    let target = TargetCode::new("import x from \"y\"");
    let err = runtime_error(SandboxEvaluator::default().execute(
        &target,
        &SandboxResolver::new(&ScopeMapping::new()),
        "",
    ));
    assert_eq!(
        err.message,
        "SyntaxError: Cannot use import statement outside a module"
    );
    assert_eq!(err.location, Some(Location::new(1, 1)));
}

#[test]
fn test_leftover_jsx_cannot_run() {
    let source = "const a = <p>hi</p>";
    let config = TransformConfig::new(Vec::<String>::new(), ["syntax-jsx"]);
    let target = transform(source, &config).unwrap();

    let err = runtime_error(SandboxEvaluator::default().execute(
        &target,
        &SandboxResolver::new(&ScopeMapping::new()),
        source,
    ));
    assert_eq!(err.message, "SyntaxError: Unexpected token '<'");
}

/* ===================== Isolation ===================== */

#[test]
fn test_runs_share_no_state() {
    let scope = ScopeMapping::new().with("cfg", Val::empty_obj());
    let source = r#"
        import cfg from "cfg"
        cfg.hits = (cfg.hits ?? 0) + 1
        export default cfg.hits
    "#;

    assert_eq!(execute(source, &scope), Ok(Val::Num(1.0)));
    assert_eq!(execute(source, &scope), Ok(Val::Num(1.0)));
    assert_eq!(scope.get("cfg"), Some(&Val::empty_obj()));
}
