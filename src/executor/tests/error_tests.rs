//! Tests for throw, try/catch/finally and runtime errors

use super::helpers::{completion, num_list, run_program};
use crate::executor::{errors, Control, Val};

#[test]
fn test_undefined_variable_is_a_reference_error() {
    let vm = run_program("y + 1");

    let Control::Throw(Val::Error(err)) = vm.control else {
        unreachable!("Expected Control::Throw with Error, got {:?}", vm.control);
    };
    assert_eq!(err.code, errors::REFERENCE_ERROR);
    assert_eq!(err.message, "y is not defined");
}

#[test]
fn test_reading_from_undefined_is_a_type_error() {
    let vm = run_program("const o = {}\no.a.b");

    let Control::Throw(Val::Error(err)) = vm.control else {
        unreachable!("Expected Control::Throw with Error, got {:?}", vm.control);
    };
    assert_eq!(err.code, errors::TYPE_ERROR);
    assert_eq!(err.message, "Cannot read properties of undefined (reading 'b')");
}

#[test]
fn test_throw_any_value() {
    let vm = run_program(r#"throw "plain""#);
    assert_eq!(vm.control, Control::Throw(Val::str("plain")));
}

#[test]
fn test_catch_binds_the_error() {
    let source = r#"
        let seen = null
        try {
            throw new Error("boom")
        } catch (e) {
            seen = e.name + ": " + e.message
        }
        seen
    "#;
    assert_eq!(completion(source), Val::str("Error: boom"));
}

#[test]
fn test_catch_handles_runtime_errors() {
    let source = r#"
        let code = null
        try {
            missing()
        } catch (e) {
            code = e.name
        }
        code
    "#;
    assert_eq!(completion(source), Val::str("ReferenceError"));
}

#[test]
fn test_finally_always_runs() {
    let source = r#"
        const log = []
        function f() {
            try {
                log.push(1)
                return "done"
            } finally {
                log.push(2)
            }
        }
        f()
        log
    "#;
    assert_eq!(completion(source), num_list(&[1.0, 2.0]));
}

#[test]
fn test_return_in_finally_wins() {
    let source = r#"
        function f() {
            try {
                return 1
            } finally {
                return 2
            }
        }
        f()
    "#;
    assert_eq!(completion(source), Val::Num(2.0));
}

#[test]
fn test_rethrow_from_catch() {
    let vm = run_program(
        r#"
        try {
            throw TypeError("inner")
        } catch (e) {
            throw RangeError("outer: " + e.message)
        }
        "#,
    );

    let Control::Throw(Val::Error(err)) = vm.control else {
        unreachable!("Expected Control::Throw with Error, got {:?}", vm.control);
    };
    assert_eq!(err.code, errors::RANGE_ERROR);
    assert_eq!(err.message, "outer: inner");
}

#[test]
fn test_error_thrown_inside_function_reaches_caller() {
    let source = r#"
        function fail() {
            throw new TypeError("bad")
        }
        let caught = false
        try {
            fail()
        } catch (e) {
            caught = e.message == "bad"
        }
        caught
    "#;
    assert_eq!(completion(source), Val::Bool(true));
}
