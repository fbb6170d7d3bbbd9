//! Tests for function declarations, closures and calls

use super::helpers::{completion, num_list, run_program};
use crate::executor::{errors, Control, Val};

#[test]
fn test_function_declarations_are_hoisted() {
    let source = r#"
        const v = twice(4)
        function twice(n) {
            return n * 2
        }
        v
    "#;
    assert_eq!(completion(source), Val::Num(8.0));
}

#[test]
fn test_closure_keeps_its_scope() {
    let source = r#"
        function counter() {
            let n = 0
            return () => {
                n += 1
                return n
            }
        }
        const next = counter()
        next()
        next()
    "#;
    assert_eq!(completion(source), Val::Num(2.0));
}

#[test]
fn test_default_parameters() {
    let source = r#"
        const add = (a, b = 10) => a + b;
        [add(1), add(1, 2)]
    "#;
    assert_eq!(completion(source), num_list(&[11.0, 3.0]));
}

#[test]
fn test_recursion() {
    let source = r#"
        function fact(n) {
            if (n <= 1) return 1
            return n * fact(n - 1)
        }
        fact(5)
    "#;
    assert_eq!(completion(source), Val::Num(120.0));
}

#[test]
fn test_named_function_expression_sees_itself() {
    let source = r#"
        const sum = function go(n) { return n <= 0 ? 0 : n + go(n - 1) }
        sum(3)
    "#;
    assert_eq!(completion(source), Val::Num(6.0));
}

#[test]
fn test_array_methods_take_closures() {
    assert_eq!(
        completion("[1, 2, 3].map(x => x * 2).filter(x => x > 2)"),
        num_list(&[4.0, 6.0])
    );
    assert_eq!(
        completion("[1, 2, 3].reduce((acc, x) => acc + x, 0)"),
        Val::Num(6.0)
    );
}

#[test]
fn test_missing_arguments_are_undefined() {
    assert_eq!(
        completion("function f(a, b) { return typeof b }\nf(1)"),
        Val::str("undefined")
    );
}

#[test]
fn test_calling_a_non_function_throws() {
    let vm = run_program("const x = 1\nx()");

    let Control::Throw(Val::Error(err)) = vm.control else {
        unreachable!("Expected Control::Throw with Error, got {:?}", vm.control);
    };
    assert_eq!(err.code, errors::TYPE_ERROR);
    assert_eq!(err.message, "x is not a function");
}
