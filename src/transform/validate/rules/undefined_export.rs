//! Rule: Undefined Export
//!
//! `export { a }` must name a binding declared at the top level of the module.

use std::collections::HashSet;

use crate::executor::types::ast::{Module, Stmt};

use super::super::{ValidationError, ValidationRule};

pub struct UndefinedExportRule;

impl ValidationRule for UndefinedExportRule {
    fn id(&self) -> &'static str {
        "undefined-export"
    }

    fn description(&self) -> &'static str {
        "Exported names must be declared in the module"
    }

    fn validate(&self, module: &Module, _source: &str) -> Vec<ValidationError> {
        let declared = top_level_bindings(&module.body);

        let mut errors = Vec::new();
        for stmt in &module.body {
            if let Stmt::ExportNamed { specifiers, .. } = stmt {
                for spec in specifiers {
                    if !declared.contains(spec.local.as_str()) {
                        errors.push(ValidationError::error(
                            spec.span,
                            format!("Export '{}' is not defined", spec.local),
                            self.id(),
                        ));
                    }
                }
            }
        }
        errors
    }
}

fn top_level_bindings(body: &[Stmt]) -> HashSet<&str> {
    let mut names = HashSet::new();
    for stmt in body {
        collect(stmt, &mut names);
    }
    names
}

fn collect<'a>(stmt: &'a Stmt, names: &mut HashSet<&'a str>) {
    match stmt {
        Stmt::Declare { decls, .. } => {
            for decl in decls {
                names.extend(decl.target.names());
            }
        }
        Stmt::Function { def, .. } => {
            if let Some(name) = &def.name {
                names.insert(name);
            }
        }
        Stmt::Import { specifiers, .. } => {
            names.extend(specifiers.iter().map(|s| s.local()));
        }
        Stmt::ExportDecl { decl, .. } => collect(decl, names),
        _ => {}
    }
}
