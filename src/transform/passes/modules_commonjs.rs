//! ES module syntax → `require` / `exports`
//!
//! ```text
//! import D, { a as b } from "x"   →  const _x = require("x");
//!                                    const D = _x != null && _x.default !== undefined ? _x.default : _x;
//!                                    const b = _x.a;
//! import * as ns from "x"         →  const ns = require("x");
//! import "x"                      →  require("x");
//! export default e                →  exports.default = e;
//! export const a = 1              →  const a = 1;  ...  exports.a = a;
//! export { a as b }               →  ...  exports.b = a;
//! ```
//!
//! Named and declaration exports are assigned once, after the rest of the
//! module has run, so they observe the bindings' final values.

use std::rc::Rc;

use crate::executor::types::ast::{
    ArithOp, BinaryOp, DeclareTarget, Declarator, Expr, FunctionKind, ImportSpecifier,
    MemberAccess, Module, Span, Stmt, VarKind,
};

use super::{Pass, PassContext};

pub struct ModulesCommonJs;

impl Pass for ModulesCommonJs {
    fn name(&self) -> &'static str {
        "transform-modules-commonjs"
    }

    fn description(&self) -> &'static str {
        "Lower import/export to require() and exports assignments"
    }

    fn apply(&self, module: &mut Module, cx: &mut PassContext) {
        let mut body = Vec::with_capacity(module.body.len());
        let mut trailing = Vec::new();

        for stmt in std::mem::take(&mut module.body) {
            match stmt {
                Stmt::Import {
                    specifiers,
                    source,
                    span,
                } => lower_import(specifiers, &source, span, cx, &mut body),

                Stmt::ExportDefault { value, span } => {
                    body.push(export_assign("default", value, span));
                }

                Stmt::ExportDecl {
                    decl,
                    default,
                    span,
                } => {
                    let decl = *decl;
                    if default {
                        if let Stmt::Function { def, .. } = &decl {
                            if let Some(name) = &def.name {
                                trailing.push(export_assign("default", Expr::ident(name, span), span));
                            }
                        }
                    } else {
                        for name in declared_names(&decl) {
                            trailing.push(export_assign(&name, Expr::ident(&name, span), span));
                        }
                    }
                    body.push(decl);
                }

                Stmt::ExportNamed { specifiers, span } => {
                    for spec in specifiers {
                        trailing.push(export_assign(
                            &spec.exported,
                            Expr::ident(&spec.local, spec.span),
                            span,
                        ));
                    }
                }

                other => body.push(other),
            }
        }

        body.extend(trailing);
        module.body = body;
    }
}

fn lower_import(
    specifiers: Vec<ImportSpecifier>,
    source: &str,
    span: Span,
    cx: &mut PassContext,
    out: &mut Vec<Stmt>,
) {
    let require = Expr::call(
        Expr::ident("require", span),
        vec![Expr::string(source, span)],
        span,
    );

    if specifiers.is_empty() {
        out.push(Stmt::Expr {
            expr: require,
            span,
        });
        return;
    }

    let namespace = specifiers.iter().find_map(|s| match s {
        ImportSpecifier::Namespace { local, .. } => Some(local.clone()),
        _ => None,
    });
    let binding = namespace.unwrap_or_else(|| cx.uid(source));
    out.push(const_decl(&binding, require, span));

    for spec in specifiers {
        match spec {
            ImportSpecifier::Namespace { .. } => {}
            ImportSpecifier::Default { local, span } => {
                out.push(const_decl(&local, default_interop(&binding, span), span));
            }
            ImportSpecifier::Named {
                imported, local, span,
            } => {
                let value = Expr::member(Expr::ident(&binding, span), imported, span);
                out.push(const_decl(&local, value, span));
            }
        }
    }
}

/// `m != null && m.default !== undefined ? m.default : m`
fn default_interop(binding: &str, span: Span) -> Expr {
    let module = || Expr::ident(binding, span);
    let default = || Expr::member(module(), "default", span);

    let has_default = Expr::BinaryOp {
        op: BinaryOp::And,
        left: Box::new(Expr::Arith {
            op: ArithOp::Ne,
            left: Box::new(module()),
            right: Box::new(Expr::LitNull { span }),
            span,
        }),
        right: Box::new(Expr::Arith {
            op: ArithOp::StrictNe,
            left: Box::new(default()),
            right: Box::new(Expr::ident("undefined", span)),
            span,
        }),
        span,
    };

    Expr::Ternary {
        condition: Box::new(has_default),
        consequent: Box::new(default()),
        alternate: Box::new(module()),
        span,
    }
}

fn const_decl(name: &str, init: Expr, span: Span) -> Stmt {
    Stmt::Declare {
        var_kind: VarKind::Const,
        decls: vec![Declarator {
            target: DeclareTarget::Simple {
                name: name.to_string(),
                span,
            },
            init: Some(init),
            span,
        }],
        span,
    }
}

fn export_assign(name: &str, value: Expr, span: Span) -> Stmt {
    // `export default function () {}` arrives as a function expression
    let value = match value {
        Expr::Function { def, span } if def.kind == FunctionKind::Declaration => {
            let mut def = def.as_ref().clone();
            def.kind = FunctionKind::Expression;
            Expr::Function {
                def: Rc::new(def),
                span,
            }
        }
        other => other,
    };
    Stmt::Assign {
        var: "exports".to_string(),
        var_span: span,
        path: vec![MemberAccess::Prop {
            property: name.to_string(),
            span,
        }],
        value,
        span,
    }
}

fn declared_names(decl: &Stmt) -> Vec<String> {
    match decl {
        Stmt::Declare { decls, .. } => decls
            .iter()
            .flat_map(|d| d.target.names())
            .map(str::to_string)
            .collect(),
        Stmt::Function { def, .. } => def.name.iter().cloned().collect(),
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;
    use crate::transform::codegen::generate;

    fn lower(source: &str) -> String {
        let mut module = parse_module(source).unwrap();
        let mut cx = PassContext::new(&module);
        ModulesCommonJs.apply(&mut module, &mut cx);
        generate(&module).code
    }

    #[test]
    fn test_named_import() {
        assert_eq!(
            lower("import { Foo } from \"bar\"; export default Foo;"),
            "const _bar = require(\"bar\"); const Foo = _bar.Foo; exports.default = Foo;"
        );
    }

    #[test]
    fn test_default_import_reads_default_when_present() {
        assert_eq!(
            lower("import React from \"react\""),
            "const _react = require(\"react\"); \
             const React = _react != null && _react.default !== undefined ? _react.default : _react;"
        );
    }

    #[test]
    fn test_namespace_and_side_effect_imports() {
        assert_eq!(
            lower("import * as ns from \"lib\"\nimport \"polyfill\""),
            "const ns = require(\"lib\");\nrequire(\"polyfill\");"
        );
    }

    #[test]
    fn test_declaration_exports_are_assigned_at_the_end() {
        assert_eq!(
            lower("export const a = 1, { b } = o\nexport function f() {}\nexport { a as c }"),
            "const a = 1, { b } = o;\nfunction f() {} exports.a = a; exports.b = b; exports.f = f;\nexports.c = a;"
        );
    }

    #[test]
    fn test_default_function_export() {
        assert_eq!(
            lower("export default function main() { return 1 }"),
            "function main() { return 1; } exports.default = main;"
        );
    }

    #[test]
    fn test_generated_binding_avoids_collisions() {
        let code = lower("const _bar = 0\nimport { x } from \"bar\"");
        assert!(code.contains("const _bar2 = require(\"bar\"); const x = _bar2.x;"));
    }
}
