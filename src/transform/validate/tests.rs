//! Tests for module validation

use super::*;
use crate::parser::parse_module;

// ============================================================================
// Helper Functions
// ============================================================================

fn validate(source: &str) -> Vec<ValidationError> {
    let module = parse_module(source).expect("Parse should succeed");
    validate_module(&module, source)
}

fn has_rule(errors: &[ValidationError], rule_id: &str) -> bool {
    errors.iter().any(|e| e.rule_id == rule_id)
}

fn for_rule<'a>(errors: &'a [ValidationError], rule_id: &str) -> Vec<&'a ValidationError> {
    errors.iter().filter(|e| e.rule_id == rule_id).collect()
}

// ============================================================================
// Module Item Placement
// ============================================================================

#[test]
fn test_nested_import_is_rejected() {
    let errors = validate("if (x) {\n  import a from \"a\"\n}");
    let found = for_rule(&errors, "module-item-placement");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].span.start_line, 1);
}

#[test]
fn test_top_level_module_items_are_fine() {
    let errors = validate("import a from \"a\"\nexport default a\nexport const b = a");
    assert!(!has_rule(&errors, "module-item-placement"));
}

// ============================================================================
// Return / Loop Control
// ============================================================================

#[test]
fn test_top_level_return() {
    let errors = validate("return 1");
    assert!(has_rule(&errors, "return-outside-function"));
}

#[test]
fn test_return_inside_functions() {
    let errors = validate("function f() { return 1 }\nconst g = () => { return 2 }");
    assert!(!has_rule(&errors, "return-outside-function"));
}

#[test]
fn test_break_outside_loop() {
    let errors = validate("if (a) { break }");
    let found = for_rule(&errors, "loop-control");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "Illegal break statement");
}

#[test]
fn test_loop_does_not_cover_nested_function() {
    let errors = validate("while (a) { items.forEach(function (i) { continue }) }");
    assert!(has_rule(&errors, "loop-control"));
}

#[test]
fn test_break_and_continue_inside_loops() {
    let source = r#"
for (const x of xs) { if (x) { continue } }
while (true) { break }
for (let i = 0; i < 3; i++) { if (i) break }
"#;
    assert!(!has_rule(&validate(source), "loop-control"));
}

// ============================================================================
// Duplicate Declaration
// ============================================================================

#[test]
fn test_duplicate_import_binding() {
    let errors = validate("import { a } from \"x\"\nimport a from \"y\"");
    let found = for_rule(&errors, "duplicate-declaration");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "Identifier 'a' has already been declared");
}

#[test]
fn test_let_after_import() {
    let errors = validate("import { a } from \"x\"\nlet a = 1");
    assert!(has_rule(&errors, "duplicate-declaration"));
}

#[test]
fn test_var_may_repeat_and_blocks_shadow() {
    let source = r#"
var a = 1
var a = 2
const b = 1
{ const b = 2 }
function f(b) { var b = 3 }
"#;
    assert!(!has_rule(&validate(source), "duplicate-declaration"));
}

#[test]
fn test_let_conflicts_with_parameter() {
    let errors = validate("function f(a) { let a = 1 }");
    assert!(has_rule(&errors, "duplicate-declaration"));
}

// ============================================================================
// Exports / Imports
// ============================================================================

#[test]
fn test_undefined_export() {
    let errors = validate("const a = 1\nexport { a, b }");
    let found = for_rule(&errors, "undefined-export");
    assert_eq!(found.len(), 1);
    assert!(found[0].message.contains("'b'"));
}

#[test]
fn test_unused_import_is_a_warning() {
    let errors = validate("import { a, b } from \"x\"\nexport default a");
    let found = for_rule(&errors, "unused-import");
    assert_eq!(found.len(), 1);
    assert!(!found[0].is_error());
}

#[test]
fn test_jsx_counts_as_react_use() {
    let errors = validate("import React from \"react\"\nimport Foo from \"foo\"\nexport default <Foo />");
    assert!(!has_rule(&errors, "unused-import"));
}

// ============================================================================
// Public API
// ============================================================================

#[test]
fn test_check_reports_first_error_by_position() {
    let source = "break\nreturn 1";
    let module = parse_module(source).unwrap();
    let err = check(&module, source).unwrap_err();
    let TransformError::Validation { rule, location, .. } = err else {
        unreachable!("Expected validation error, got {:?}", err);
    };
    assert_eq!(rule, "loop-control");
    assert_eq!(location, Some(Location::new(1, 1)));
}

#[test]
fn test_warnings_do_not_fail_check() {
    let source = "import { unused } from \"x\"";
    let module = parse_module(source).unwrap();
    assert!(check(&module, source).is_ok());
}

#[test]
fn test_rules_are_listed() {
    let validator = Validator::new();
    let ids: Vec<_> = validator.rules().map(|(id, _)| id).collect();
    assert!(ids.contains(&"duplicate-declaration"));
    assert!(ids.contains(&"unused-import"));
}
