//! Rule: Loop Control
//!
//! `break` and `continue` need an enclosing loop in the same function.
//!
//! ```text
//! while (a) { [1].forEach(function () { break }) }   // error: the loop is outside the function
//! ```

use crate::executor::types::ast::{FunctionDef, Module, Stmt};
use crate::executor::types::visit::{walk_function, walk_module, walk_stmt, Visitor};

use super::super::{ValidationError, ValidationRule};

pub struct LoopControlRule;

impl ValidationRule for LoopControlRule {
    fn id(&self) -> &'static str {
        "loop-control"
    }

    fn description(&self) -> &'static str {
        "break and continue must be inside a loop"
    }

    fn validate(&self, module: &Module, _source: &str) -> Vec<ValidationError> {
        let mut checker = Checker {
            loop_depth: 0,
            errors: Vec::new(),
            rule_id: self.id(),
        };
        walk_module(&mut checker, module);
        checker.errors
    }
}

struct Checker {
    loop_depth: usize,
    errors: Vec<ValidationError>,
    rule_id: &'static str,
}

impl Visitor for Checker {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::While { .. } | Stmt::For { .. } | Stmt::ForLoop { .. } => {
                self.loop_depth += 1;
                walk_stmt(self, stmt);
                self.loop_depth -= 1;
            }
            Stmt::Break { span } if self.loop_depth == 0 => {
                self.errors.push(ValidationError::error(
                    *span,
                    "Illegal break statement",
                    self.rule_id,
                ));
            }
            Stmt::Continue { span } if self.loop_depth == 0 => {
                self.errors.push(ValidationError::error(
                    *span,
                    "Illegal continue statement: no surrounding iteration statement",
                    self.rule_id,
                ));
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_function(&mut self, def: &FunctionDef) {
        let outer = std::mem::replace(&mut self.loop_depth, 0);
        walk_function(self, def);
        self.loop_depth = outer;
    }
}
