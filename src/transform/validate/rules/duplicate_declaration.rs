//! Rule: Duplicate Declaration
//!
//! A name may be declared once per scope with `let`, `const`, `import` or a
//! module-level `function`. `var` may repeat, but not alongside any of those.
//!
//! ```text
//! import { a } from "x"
//! const a = 1              // error: 'a' has already been declared
//! ```

use std::collections::HashMap;

use crate::executor::types::ast::{
    DeclareTarget, FunctionBody, FunctionDef, Module, Span, Stmt, VarKind,
};
use crate::executor::types::visit::{walk_declare_target, walk_stmt, Visitor};

use super::super::{ValidationError, ValidationRule};

pub struct DuplicateDeclarationRule;

impl ValidationRule for DuplicateDeclarationRule {
    fn id(&self) -> &'static str {
        "duplicate-declaration"
    }

    fn description(&self) -> &'static str {
        "let, const, import and function bindings must be unique per scope"
    }

    fn validate(&self, module: &Module, _source: &str) -> Vec<ValidationError> {
        let mut checker = Checker {
            scopes: vec![HashMap::new()],
            errors: Vec::new(),
            rule_id: self.id(),
        };
        for stmt in &module.body {
            checker.visit_stmt(stmt);
        }
        checker.errors
    }
}

// ============================================================================
// Scope Tracking
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Lexical,
    /// `var`, parameters, and functions below the module level
    Hoisted,
}

struct Checker {
    scopes: Vec<HashMap<String, Binding>>,
    errors: Vec<ValidationError>,
    rule_id: &'static str,
}

impl Checker {
    fn declare(&mut self, name: &str, binding: Binding, span: Span) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        match scope.get(name) {
            Some(Binding::Hoisted) if binding == Binding::Hoisted => {}
            Some(_) => self.errors.push(ValidationError::error(
                span,
                format!("Identifier '{}' has already been declared", name),
                self.rule_id,
            )),
            None => {
                scope.insert(name.to_string(), binding);
            }
        }
    }

    fn declare_target(&mut self, target: &DeclareTarget, binding: Binding) {
        let span = target.span();
        for name in target.names() {
            self.declare(name, binding, span);
        }
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(HashMap::new());
        f(self);
        self.scopes.pop();
    }
}

impl Visitor for Checker {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block { .. } | Stmt::For { .. } | Stmt::ForLoop { .. } => {
                self.scoped(|checker| {
                    if let Stmt::ForLoop {
                        binding,
                        binding_span,
                        ..
                    } = stmt
                    {
                        checker.declare(binding, Binding::Lexical, *binding_span);
                    }
                    walk_stmt(checker, stmt);
                });
            }
            Stmt::Declare {
                var_kind, decls, ..
            } => {
                let binding = match var_kind {
                    VarKind::Var => Binding::Hoisted,
                    VarKind::Let | VarKind::Const => Binding::Lexical,
                };
                for decl in decls {
                    self.declare_target(&decl.target, binding);
                }
                walk_stmt(self, stmt);
            }
            Stmt::Function { def, span } => {
                if let Some(name) = &def.name {
                    let binding = if self.scopes.len() == 1 {
                        Binding::Lexical
                    } else {
                        Binding::Hoisted
                    };
                    self.declare(name, binding, *span);
                }
                walk_stmt(self, stmt);
            }
            Stmt::Import { specifiers, .. } => {
                for spec in specifiers {
                    self.declare(spec.local(), Binding::Lexical, spec.span());
                }
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_function(&mut self, def: &FunctionDef) {
        self.scoped(|checker| {
            for param in &def.params {
                checker.declare_target(&param.target, Binding::Hoisted);
                walk_declare_target(checker, &param.target);
                if let Some(default) = &param.default {
                    checker.visit_expr(default);
                }
            }
            match &def.body {
                // Parameters and the body's top level share one scope
                FunctionBody::Block { body } => match body.as_ref() {
                    Stmt::Block { body, .. } => {
                        for stmt in body {
                            checker.visit_stmt(stmt);
                        }
                    }
                    other => checker.visit_stmt(other),
                },
                FunctionBody::Expr { expr } => checker.visit_expr(expr),
            }
        });
    }
}
