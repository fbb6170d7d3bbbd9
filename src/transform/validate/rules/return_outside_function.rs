//! Rule: Return Outside Function
//!
//! A module body is not a function body, so a top-level `return` is an error.

use crate::executor::types::ast::{FunctionDef, Module, Stmt};
use crate::executor::types::visit::{walk_function, walk_module, walk_stmt, Visitor};

use super::super::{ValidationError, ValidationRule};

pub struct ReturnOutsideFunctionRule;

impl ValidationRule for ReturnOutsideFunctionRule {
    fn id(&self) -> &'static str {
        "return-outside-function"
    }

    fn description(&self) -> &'static str {
        "return is only allowed inside a function body"
    }

    fn validate(&self, module: &Module, _source: &str) -> Vec<ValidationError> {
        let mut checker = Checker {
            function_depth: 0,
            errors: Vec::new(),
            rule_id: self.id(),
        };
        walk_module(&mut checker, module);
        checker.errors
    }
}

struct Checker {
    function_depth: usize,
    errors: Vec<ValidationError>,
    rule_id: &'static str,
}

impl Visitor for Checker {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Return { span, .. } = stmt {
            if self.function_depth == 0 {
                self.errors.push(ValidationError::error(
                    *span,
                    "'return' outside of function",
                    self.rule_id,
                ));
            }
        }
        walk_stmt(self, stmt);
    }

    fn visit_function(&mut self, def: &FunctionDef) {
        self.function_depth += 1;
        walk_function(self, def);
        self.function_depth -= 1;
    }
}
