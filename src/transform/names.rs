//! Collision-free names for bindings introduced by passes

use std::collections::HashSet;

use crate::executor::types::ast::{DeclareTarget, Expr, FunctionDef, Module, Stmt};
use crate::executor::types::visit::{walk_expr, walk_function, walk_module, walk_stmt, Visitor};

/// Hands out `_name`, `_name2`, ... avoiding every name the module mentions
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    used: HashSet<String>,
}

impl NameGenerator {
    pub fn for_module(module: &Module) -> Self {
        let mut collector = NameCollector::default();
        walk_module(&mut collector, module);
        Self {
            used: collector.names,
        }
    }

    /// A fresh identifier derived from `hint` (e.g. a module specifier)
    pub fn generate(&mut self, hint: &str) -> String {
        let base = format!("_{}", to_identifier(hint));
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// `"./lib/react-dom.js"` → `reactDom`
fn to_identifier(hint: &str) -> String {
    let basename = hint
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(hint);
    let stem = basename.split('.').next().unwrap_or(basename);

    let mut out = String::new();
    let mut upper_next = false;
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() || ch == '$' {
            if upper_next && !out.is_empty() {
                out.push(ch.to_ascii_uppercase());
            } else {
                out.push(ch);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }

    let out = out.trim_start_matches(|c: char| c.is_ascii_digit()).to_string();
    if out.is_empty() {
        "temp".to_string()
    } else {
        out
    }
}

#[derive(Default)]
struct NameCollector {
    names: HashSet<String>,
}

impl NameCollector {
    fn target(&mut self, target: &DeclareTarget) {
        for name in target.names() {
            self.names.insert(name.to_string());
        }
    }
}

impl Visitor for NameCollector {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare { decls, .. } => {
                for decl in decls {
                    self.target(&decl.target);
                }
            }
            Stmt::Assign { var, .. } => {
                self.names.insert(var.clone());
            }
            Stmt::ForLoop { binding, .. } => {
                self.names.insert(binding.clone());
            }
            Stmt::Try {
                catch: Some(clause),
                ..
            } => {
                if let Some(var) = &clause.var {
                    self.names.insert(var.clone());
                }
            }
            Stmt::Import { specifiers, .. } => {
                for spec in specifiers {
                    self.names.insert(spec.local().to_string());
                }
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Ident { name, .. } = expr {
            self.names.insert(name.clone());
        }
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, def: &FunctionDef) {
        if let Some(name) = &def.name {
            self.names.insert(name.clone());
        }
        for param in &def.params {
            self.target(&param.target);
        }
        walk_function(self, def);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    #[test]
    fn test_identifier_from_specifier() {
        assert_eq!(to_identifier("bar"), "bar");
        assert_eq!(to_identifier("react-dom"), "reactDom");
        assert_eq!(to_identifier("./lib/util.js"), "util");
        assert_eq!(to_identifier("@scope/pkg/"), "pkg");
        assert_eq!(to_identifier("123"), "temp");
    }

    #[test]
    fn test_avoids_names_in_use() {
        let module = parse_module("const _bar = 1\nfunction f(_bar2) { return _bar2 }").unwrap();
        let mut names = NameGenerator::for_module(&module);
        assert_eq!(names.generate("bar"), "_bar3");
        assert_eq!(names.generate("bar"), "_bar4");
        assert_eq!(names.generate("baz"), "_baz");
    }
}
