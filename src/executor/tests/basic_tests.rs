//! Tests for literals, operators, bindings and reference semantics

use super::helpers::{completion, num_list, run_program};
use crate::executor::{errors, Control, Val};

/* ===================== Operators ===================== */

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(completion("1 + 2 * 3"), Val::Num(7.0));
    assert_eq!(completion("(1 + 2) * 3"), Val::Num(9.0));
    assert_eq!(completion("7 % 4"), Val::Num(3.0));
}

#[test]
fn test_string_concatenation_converts_numbers() {
    assert_eq!(completion(r#""a" + 1 + 2"#), Val::str("a12"));
    assert_eq!(completion(r#"1 + 2 + "a""#), Val::str("3a"));
}

#[test]
fn test_equality_flavours() {
    assert_eq!(
        completion("[null == undefined, null === undefined, 1 == \"1\", 1 === \"1\"]"),
        Val::list(vec![
            Val::Bool(true),
            Val::Bool(false),
            Val::Bool(true),
            Val::Bool(false),
        ])
    );
}

#[test]
fn test_typeof() {
    assert_eq!(completion(r#"typeof "s""#), Val::str("string"));
    assert_eq!(completion("typeof undefined"), Val::str("undefined"));
    assert_eq!(completion("typeof (() => 1)"), Val::str("function"));
}

#[test]
fn test_optional_chaining_and_nullish() {
    let source = r#"
        const o = null
        o?.a ?? "fallback"
    "#;
    assert_eq!(completion(source), Val::str("fallback"));
}

#[test]
fn test_template_literal() {
    assert_eq!(completion("`x=${1 + 1}!`"), Val::str("x=2!"));
}

/* ===================== Bindings ===================== */

#[test]
fn test_block_scoping() {
    let source = r#"
        let x = 1
        {
            let x = 2
        }
        x
    "#;
    assert_eq!(completion(source), Val::Num(1.0));
}

#[test]
fn test_const_reassignment_throws() {
    let vm = run_program("const x = 1\nx = 2");

    let Control::Throw(Val::Error(err)) = vm.control else {
        unreachable!("Expected Control::Throw with Error, got {:?}", vm.control);
    };
    assert_eq!(err.code, errors::TYPE_ERROR);
    assert_eq!(err.message, "Assignment to constant variable.");
}

#[test]
fn test_destructuring_with_default() {
    let source = r#"
        const { a, b = 5, c: renamed } = { a: 1, c: 3 }
        a + b + renamed
    "#;
    assert_eq!(completion(source), Val::Num(9.0));
}

#[test]
fn test_compound_assignment_and_update() {
    let source = r#"
        let n = 10
        n += 5
        n--
        n
    "#;
    assert_eq!(completion(source), Val::Num(14.0));
}

/* ===================== Objects and Arrays ===================== */

#[test]
fn test_objects_are_shared_references() {
    let source = r#"
        const a = { n: 1 }
        const b = a
        b.n = 2
        a.n
    "#;
    assert_eq!(completion(source), Val::Num(2.0));
}

#[test]
fn test_missing_property_is_undefined() {
    assert_eq!(completion("const o = {}\no.missing"), Val::Undefined);
}

#[test]
fn test_spread_into_array_and_object() {
    assert_eq!(
        completion("const xs = [2, 3];\n[1, ...xs]"),
        num_list(&[1.0, 2.0, 3.0])
    );
    assert_eq!(
        completion("const base = { a: 1 }\nconst o = { ...base, b: 2 }\no.a + o.b"),
        Val::Num(3.0)
    );
}

#[test]
fn test_array_push_mutates_in_place() {
    let source = r#"
        const xs = []
        xs.push(1)
        xs.push(2)
        xs.length
    "#;
    assert_eq!(completion(source), Val::Num(2.0));
}

#[test]
fn test_intrinsics_are_available() {
    assert_eq!(completion("Math.max(1, 5, 3)"), Val::Num(5.0));
    assert_eq!(
        completion("JSON.stringify({ b: 1, a: [true] })"),
        Val::str(r#"{"a":[true],"b":1}"#)
    );
    assert_eq!(completion(r#"Object.keys({ y: 1, x: 2 }).join(",")"#), Val::str("x,y"));
}
