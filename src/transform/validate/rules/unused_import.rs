//! Rule: Unused Import (warning)
//!
//! Reports imported bindings that nothing in the module reads. Any JSX in
//! the module counts as a read of `React`, which lowered JSX refers to.

use std::collections::HashSet;

use crate::executor::types::ast::{Expr, JsxElement, JsxName, Module, ObjProp, Stmt};
use crate::executor::types::visit::{walk_expr, walk_jsx_element, walk_module, walk_stmt, Visitor};

use super::super::{ValidationError, ValidationRule};

pub struct UnusedImportRule;

impl ValidationRule for UnusedImportRule {
    fn id(&self) -> &'static str {
        "unused-import"
    }

    fn description(&self) -> &'static str {
        "Imported bindings should be used"
    }

    fn validate(&self, module: &Module, _source: &str) -> Vec<ValidationError> {
        let mut reads = Reads::default();
        walk_module(&mut reads, module);
        if reads.has_jsx {
            reads.names.insert("React".to_string());
        }

        let mut warnings = Vec::new();
        for stmt in &module.body {
            if let Stmt::Import { specifiers, .. } = stmt {
                for spec in specifiers {
                    if !reads.names.contains(spec.local()) {
                        warnings.push(ValidationError::warning(
                            spec.span(),
                            format!("'{}' is imported but never used", spec.local()),
                            self.id(),
                        ));
                    }
                }
            }
        }
        warnings
    }
}

#[derive(Default)]
struct Reads {
    names: HashSet<String>,
    has_jsx: bool,
}

impl Visitor for Reads {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign { var, .. } => {
                self.names.insert(var.clone());
            }
            Stmt::ExportNamed { specifiers, .. } => {
                self.names.extend(specifiers.iter().map(|s| s.local.clone()));
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident { name, .. } => {
                self.names.insert(name.clone());
            }
            Expr::LitObj { properties, .. } => {
                for prop in properties {
                    if let ObjProp::Shorthand { name, .. } = prop {
                        self.names.insert(name.clone());
                    }
                }
            }
            _ => {}
        }
        walk_expr(self, expr);
    }

    fn visit_jsx_element(&mut self, element: &JsxElement) {
        self.has_jsx = true;
        if let JsxName::Name { name } = &element.name {
            let head = name.split('.').next().unwrap_or(name);
            self.names.insert(head.to_string());
        }
        walk_jsx_element(self, element);
    }
}
