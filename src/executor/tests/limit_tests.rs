//! Tests for sandbox resource limits

use super::helpers::{completion, run_program, run_program_with};
use crate::executor::{errors, Control, Fault, Limits, Val, VM};
use crate::sandbox::ScopeMapping;

#[test]
fn test_infinite_loop_hits_step_limit() {
    let limits = Limits {
        max_steps: 1_000,
        ..Limits::default()
    };
    let vm = run_program_with("while (true) {}", &ScopeMapping::new(), limits);

    assert_eq!(vm.control, Control::Fault(Fault::StepLimit { limit: 1_000 }));
    assert!(vm.is_done());
}

#[test]
fn test_step_limit_cannot_be_caught() {
    let limits = Limits {
        max_steps: 500,
        ..Limits::default()
    };
    let source = r#"
        try {
            while (true) {}
        } catch (e) {
            "swallowed"
        }
    "#;
    let vm = run_program_with(source, &ScopeMapping::new(), limits);

    assert_eq!(vm.control, Control::Fault(Fault::StepLimit { limit: 500 }));
    assert_eq!(vm.completion, None);
}

#[test]
fn test_unbounded_recursion_hits_call_depth() {
    let limits = Limits {
        max_call_depth: 16,
        ..Limits::default()
    };
    let source = r#"
        function down(n) {
            return down(n + 1)
        }
        down(0)
    "#;
    let vm = run_program_with(source, &ScopeMapping::new(), limits);

    assert_eq!(vm.control, Control::Fault(Fault::CallDepth { limit: 16 }));
}

#[test]
fn test_expression_bodied_recursion_hits_call_depth() {
    let limits = Limits {
        max_call_depth: 8,
        ..Limits::default()
    };
    let vm = run_program_with(
        "const f = n => f(n + 1)\nf(0)",
        &ScopeMapping::new(),
        limits,
    );

    assert_eq!(vm.control, Control::Fault(Fault::CallDepth { limit: 8 }));
}

#[test]
fn test_deep_nesting_hits_expression_depth() {
    let limits = Limits {
        max_expr_depth: 16,
        ..Limits::default()
    };
    let source = format!("{}1{}", "[".repeat(40), "]".repeat(40));
    let vm = run_program_with(&source, &ScopeMapping::new(), limits);

    assert_eq!(vm.control, Control::Fault(Fault::ExprDepth { limit: 16 }));
}

#[test]
fn test_long_addition_chain_completes() {
    let source = format!("1{}", " + 1".repeat(2000));
    assert_eq!(completion(&source), Val::Num(2001.0));
}

/* ===================== Length Limits ===================== */

fn assert_range_error(vm: VM, message: &str) {
    let Control::Throw(Val::Error(err)) = vm.control else {
        unreachable!("Expected Control::Throw with Error, got {:?}", vm.control);
    };
    assert_eq!(err.code, errors::RANGE_ERROR);
    assert_eq!(err.message, message);
}

#[test]
fn test_index_past_array_range_is_rejected() {
    let vm = run_program("const a = []\na[\"18446744073709551615\"] = 1");
    assert_range_error(vm, "Invalid array length");
}

#[test]
fn test_huge_length_assignment_is_rejected() {
    let vm = run_program("const a = []\na.length = 1e12");
    assert_range_error(vm, "Invalid array length");
}

#[test]
fn test_sparse_write_beyond_max_length_is_rejected() {
    let vm = run_program("const a = []\na[1e9] = 1");
    assert_range_error(vm, "Invalid array length");
}

#[test]
fn test_huge_repeat_is_rejected() {
    let vm = run_program(r#""x".repeat(1e19)"#);
    assert_range_error(vm, "Invalid string length");
}

#[test]
fn test_length_errors_are_catchable() {
    let source = r#"
        let seen = ""
        try {
            "ab".repeat(1e10)
        } catch (e) {
            seen = e.name + ": " + e.message
        }
        seen
    "#;
    assert_eq!(completion(source), Val::str("RangeError: Invalid string length"));
}

#[test]
fn test_string_doubling_hits_max_length() {
    let limits = Limits {
        max_length: 64,
        ..Limits::default()
    };
    let source = r#"
        let s = "x"
        while (true) {
            s = s + s
        }
    "#;
    let vm = run_program_with(source, &ScopeMapping::new(), limits);
    assert_range_error(vm, "Invalid string length");
}

#[test]
fn test_join_hits_max_length() {
    let limits = Limits {
        max_length: 8,
        ..Limits::default()
    };
    let vm = run_program_with(
        r#"["abc", "def", "ghi"].join("-")"#,
        &ScopeMapping::new(),
        limits,
    );
    assert_range_error(vm, "Invalid string length");
}

#[test]
fn test_push_hits_max_length() {
    let limits = Limits {
        max_length: 4,
        ..Limits::default()
    };
    let vm = run_program_with(
        "const a = [1, 2, 3]\na.push(4)\na.push(5)",
        &ScopeMapping::new(),
        limits,
    );
    assert_range_error(vm, "Invalid array length");
}
