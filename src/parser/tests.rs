use crate::executor::types::ast::{
    ExportSpecifier, Expr, ForLoopKind, FunctionBody, FunctionKind, ImportSpecifier, JsxChild,
    JsxName, Stmt, VarKind,
};
use crate::parser::{is_reserved_word, parse_expression, parse_module};

#[test]
fn test_parse_simple() {
    let source = "let x = 42\nexport default x";
    let result = parse_module(source);
    assert!(result.is_ok());
}

#[test]
fn test_span_tracking() {
    let module = parse_module("let x = 42\n  f()").unwrap();
    assert_eq!(module.span.start, 0);
    assert_eq!(module.span.end, 16);

    let call = module.body[1].span();
    assert_eq!((call.start_line, call.start_col), (1, 2));
}

#[test]
fn test_semicolons_are_optional() {
    let module = parse_module("a()\nb();\n;c()").unwrap();
    let exprs = module
        .body
        .iter()
        .filter(|s| matches!(s, Stmt::Expr { .. }))
        .count();
    assert_eq!(exprs, 3);
}

#[test]
fn test_parse_error_location() {
    let err = parse_module("let x = @invalid").unwrap_err();
    assert_eq!(err.span().map(|span| span.start_line), Some(0));
    assert!(err.message().starts_with("Unexpected token"));
}

/* ===================== Modules ===================== */

#[test]
fn test_import_forms() {
    let module = parse_module(
        r#"
import React, { useState as use, Fragment } from "react"
import * as utils from "./utils"
import "./side-effect.css"
"#,
    )
    .unwrap();

    let Stmt::Import {
        specifiers, source, ..
    } = &module.body[0]
    else {
        unreachable!("Expected import, got {:?}", module.body[0]);
    };
    assert_eq!(source, "react");
    let locals: Vec<&str> = specifiers.iter().map(ImportSpecifier::local).collect();
    assert_eq!(locals, vec!["React", "use", "Fragment"]);
    assert!(matches!(
        &specifiers[1],
        ImportSpecifier::Named { imported, .. } if imported == "useState"
    ));

    let Stmt::Import { specifiers, .. } = &module.body[1] else {
        unreachable!("Expected import, got {:?}", module.body[1]);
    };
    assert!(matches!(
        &specifiers[..],
        [ImportSpecifier::Namespace { local, .. }] if local == "utils"
    ));

    let Stmt::Import {
        specifiers, source, ..
    } = &module.body[2]
    else {
        unreachable!("Expected import, got {:?}", module.body[2]);
    };
    assert!(specifiers.is_empty());
    assert_eq!(source, "./side-effect.css");
}

#[test]
fn test_export_forms() {
    let module = parse_module(
        r#"
export const a = 1, b = 2
export { a as first, b }
export default function main() {}
"#,
    )
    .unwrap();

    let Stmt::ExportDecl { decl, default, .. } = &module.body[0] else {
        unreachable!("Expected export declaration, got {:?}", module.body[0]);
    };
    assert!(!default);
    assert!(matches!(
        decl.as_ref(),
        Stmt::Declare { var_kind: VarKind::Const, decls, .. } if decls.len() == 2
    ));

    let Stmt::ExportNamed { specifiers, .. } = &module.body[1] else {
        unreachable!("Expected named export, got {:?}", module.body[1]);
    };
    let pairs: Vec<(&str, &str)> = specifiers
        .iter()
        .map(|ExportSpecifier { local, exported, .. }| (local.as_str(), exported.as_str()))
        .collect();
    assert_eq!(pairs, vec![("a", "first"), ("b", "b")]);

    assert!(matches!(
        &module.body[2],
        Stmt::ExportDecl { default: true, decl, .. } if matches!(decl.as_ref(), Stmt::Function { .. })
    ));
}

#[test]
fn test_export_default_expression() {
    let module = parse_module("export default 1 + 1").unwrap();
    assert!(matches!(
        &module.body[0],
        Stmt::ExportDefault {
            value: Expr::Arith { .. },
            ..
        }
    ));
}

/* ===================== Statements ===================== */

#[test]
fn test_for_of_and_for_in() {
    let module = parse_module("for (const x of xs) {}\nfor (let k in obj) {}").unwrap();
    assert!(matches!(
        &module.body[0],
        Stmt::ForLoop { kind: ForLoopKind::Of, binding, .. } if binding == "x"
    ));
    assert!(matches!(
        &module.body[1],
        Stmt::ForLoop { kind: ForLoopKind::In, var_kind: VarKind::Let, .. }
    ));
}

#[test]
fn test_const_needs_initializer() {
    let err = parse_module("const x").unwrap_err();
    assert_eq!(err.message(), "Missing initializer in const declaration");
}

#[test]
fn test_try_needs_catch_or_finally() {
    let err = parse_module("try {}").unwrap_err();
    assert_eq!(err.message(), "Missing catch or finally clause");
}

#[test]
fn test_reserved_words() {
    assert!(is_reserved_word("if"));
    assert!(is_reserved_word("export"));
    assert!(!is_reserved_word("React"));
    assert!(parse_module("let if = 1").is_err());
}

/* ===================== Expressions ===================== */

#[test]
fn test_concise_arrow() {
    let expr = parse_expression("(a, b = 2) => a + b").unwrap();
    let Expr::Function { def, .. } = expr else {
        unreachable!("Expected function, got {:?}", expr);
    };
    assert_eq!(def.kind, FunctionKind::Arrow);
    assert_eq!(def.params.len(), 2);
    assert!(def.params[1].default.is_some());
    assert!(matches!(def.body, FunctionBody::Expr { .. }));
}

#[test]
fn test_optional_chain() {
    let expr = parse_expression("a?.b.c").unwrap();
    let Expr::Member {
        object, optional, ..
    } = expr
    else {
        unreachable!("Expected member access, got {:?}", expr);
    };
    assert!(!optional);
    assert!(matches!(*object, Expr::Member { optional: true, .. }));
}

#[test]
fn test_template_literal_parts() {
    let expr = parse_expression("`a${1}b${2}`").unwrap();
    let Expr::Template { quasis, exprs, .. } = expr else {
        unreachable!("Expected template, got {:?}", expr);
    };
    assert_eq!(quasis, vec!["a", "b", ""]);
    assert_eq!(exprs.len(), 2);
}

#[test]
fn test_parse_expression_rejects_statements() {
    assert!(parse_expression("let x = 1").is_err());
}

/* ===================== JSX ===================== */

#[test]
fn test_jsx_element() {
    let expr = parse_expression(r#"<Foo.Bar id="a" {...rest}>hi {name}</Foo.Bar>"#).unwrap();
    let Expr::Jsx { element, .. } = expr else {
        unreachable!("Expected JSX, got {:?}", expr);
    };
    assert!(matches!(&element.name, JsxName::Name { name } if name == "Foo.Bar"));
    assert_eq!(element.attrs.len(), 2);
    assert!(!element.self_closing);
    assert!(matches!(
        &element.children[..],
        [JsxChild::Text { raw, .. }, JsxChild::Expr { expr: Some(_), .. }] if raw == "hi "
    ));
}

#[test]
fn test_jsx_fragment() {
    let expr = parse_expression("<><br /></>").unwrap();
    let Expr::Jsx { element, .. } = expr else {
        unreachable!("Expected JSX, got {:?}", expr);
    };
    assert!(matches!(element.name, JsxName::Fragment));
    assert!(matches!(
        &element.children[..],
        [JsxChild::Element { element }] if element.self_closing
    ));
}

#[test]
fn test_jsx_mismatched_closing_tag() {
    let err = parse_module("const a = <div></span>").unwrap_err();
    assert_eq!(
        err.message(),
        "Expected corresponding JSX closing tag for <div>"
    );
}
