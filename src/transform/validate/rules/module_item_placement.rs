//! Rule: Module Item Placement
//!
//! `import` and `export` may only appear as top-level statements.
//!
//! ```text
//! if (x) { import a from "a" }   // error
//! ```

use crate::executor::types::ast::{Module, Stmt};
use crate::executor::types::visit::{walk_stmt, Visitor};

use super::super::{ValidationError, ValidationRule};

pub struct ModuleItemPlacementRule;

impl ValidationRule for ModuleItemPlacementRule {
    fn id(&self) -> &'static str {
        "module-item-placement"
    }

    fn description(&self) -> &'static str {
        "import and export may only appear at the top level"
    }

    fn validate(&self, module: &Module, _source: &str) -> Vec<ValidationError> {
        let mut finder = NestedItems {
            errors: Vec::new(),
            rule_id: self.id(),
        };
        for stmt in &module.body {
            // The top-level statement itself is fine; look only beneath it
            walk_stmt(&mut finder, stmt);
        }
        finder.errors
    }
}

struct NestedItems {
    errors: Vec<ValidationError>,
    rule_id: &'static str,
}

impl Visitor for NestedItems {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if stmt.is_module_item() {
            self.errors.push(ValidationError::error(
                stmt.span(),
                "'import' and 'export' may only appear at the top level",
                self.rule_id,
            ));
        }
        walk_stmt(self, stmt);
    }
}
