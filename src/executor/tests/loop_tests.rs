//! Tests for while, for, for...of and for...in

use super::helpers::{completion, num_list};
use crate::executor::Val;

#[test]
fn test_while_with_break() {
    let source = r#"
        let i = 0
        while (true) {
            i++
            if (i == 3) break
        }
        i
    "#;
    assert_eq!(completion(source), Val::Num(3.0));
}

#[test]
fn test_for_with_continue() {
    let source = r#"
        let sum = 0
        for (let i = 0; i < 10; i++) {
            if (i % 2 == 0) continue
            sum += i
        }
        sum
    "#;
    assert_eq!(completion(source), Val::Num(25.0));
}

#[test]
fn test_for_of_over_array_and_string() {
    let source = r#"
        const out = []
        for (const x of [1, 2, 3]) {
            out.push(x * 10)
        }
        out
    "#;
    assert_eq!(completion(source), num_list(&[10.0, 20.0, 30.0]));

    let source = r#"
        let s = ""
        for (const c of "abc") {
            s = c + s
        }
        s
    "#;
    assert_eq!(completion(source), Val::str("cba"));
}

#[test]
fn test_for_in_visits_keys_in_order() {
    let source = r#"
        const keys = []
        for (const k in { b: 1, a: 2 }) {
            keys.push(k)
        }
        keys.join(",")
    "#;
    assert_eq!(completion(source), Val::str("a,b"));
}

#[test]
fn test_each_iteration_gets_its_own_binding() {
    let source = r#"
        const fns = []
        for (const x of [1, 2]) {
            fns.push(() => x)
        }
        [fns[0](), fns[1]()]
    "#;
    assert_eq!(completion(source), num_list(&[1.0, 2.0]));
}

#[test]
fn test_break_only_leaves_the_inner_loop() {
    let source = r#"
        let count = 0
        for (const a of [1, 2, 3]) {
            for (const b of [1, 2, 3]) {
                if (b == 2) break
                count++
            }
        }
        count
    "#;
    assert_eq!(completion(source), Val::Num(3.0));
}
