//! Tests for `require` and the scope mapping

use maplit::btreemap;

use super::helpers::run_program_with;
use crate::executor::{errors, Control, Fault, Limits, NativeFn, Val};
use crate::sandbox::ScopeMapping;

fn scope() -> ScopeMapping {
    ScopeMapping::from(btreemap! {
        "bar".to_string() => Val::obj(btreemap! { "Foo".to_string() => Val::Num(42.0) }),
        "zero".to_string() => Val::Num(0.0),
        "cfg".to_string() => Val::obj(btreemap! { "x".to_string() => Val::Num(1.0) }),
    })
}

fn completion_with(source: &str, scope: &ScopeMapping) -> Val {
    let vm = run_program_with(source, scope, Limits::default());
    assert_eq!(vm.control, Control::None, "Program did not complete normally");
    vm.completion.unwrap_or(Val::Undefined)
}

#[test]
fn test_require_returns_scope_value() {
    assert_eq!(
        completion_with(r#"require("bar").Foo"#, &scope()),
        Val::Num(42.0)
    );
}

#[test]
fn test_falsy_value_still_resolves() {
    assert_eq!(completion_with(r#"require("zero")"#, &scope()), Val::Num(0.0));
}

#[test]
fn test_program_cannot_write_through_to_scope() {
    let scope = scope();
    let source = r#"
        const cfg = require("cfg")
        cfg.x = 99
        require("cfg").x
    "#;
    assert_eq!(completion_with(source, &scope), Val::Num(1.0));
    assert_eq!(
        scope.get("cfg"),
        Some(&Val::obj(btreemap! { "x".to_string() => Val::Num(1.0) }))
    );
}

#[test]
fn test_unresolved_import_bypasses_catch() {
    let source = r#"
        let caught = false
        try {
            require("nope")
        } catch (e) {
            caught = true
        } finally {
            caught = true
        }
    "#;
    let vm = run_program_with(source, &scope(), Limits::default());
    assert_eq!(
        vm.control,
        Control::Fault(Fault::UnresolvedImport {
            specifier: "nope".to_string()
        })
    );
}

#[test]
fn test_require_needs_a_string() {
    let vm = run_program_with("require(1)", &scope(), Limits::default());

    let Control::Throw(Val::Error(err)) = vm.control else {
        unreachable!("Expected Control::Throw with Error, got {:?}", vm.control);
    };
    assert_eq!(err.code, errors::TYPE_ERROR);
}

#[test]
fn test_host_functions_are_callable() {
    let double = NativeFn::new("double", |args| match args.first() {
        Some(Val::Num(n)) => Ok(Val::Num(n * 2.0)),
        _ => Ok(Val::Null),
    });
    let math = Val::obj(btreemap! { "double".to_string() => Val::Native(double) });
    let scope = ScopeMapping::new().with("math", math);

    assert_eq!(
        completion_with(r#"require("math").double(21)"#, &scope),
        Val::Num(42.0)
    );
}
