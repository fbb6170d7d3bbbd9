//! `(a) => a + 1` → `function (a) { return a + 1; }`

use crate::executor::types::ast::{Expr, FunctionBody, FunctionDef, FunctionKind, Module, Stmt};
use crate::executor::types::visit::{walk_function_mut, walk_module_mut, VisitorMut};

use super::{Pass, PassContext};

pub struct ArrowFunctions;

impl Pass for ArrowFunctions {
    fn name(&self) -> &'static str {
        "transform-arrow-functions"
    }

    fn description(&self) -> &'static str {
        "Lower arrow functions to function expressions"
    }

    fn apply(&self, module: &mut Module, _cx: &mut PassContext) {
        walk_module_mut(&mut Lower, module);
    }
}

struct Lower;

impl VisitorMut for Lower {
    fn visit_function_mut(&mut self, def: &mut FunctionDef) {
        walk_function_mut(self, def);
        if def.kind != FunctionKind::Arrow {
            return;
        }
        def.kind = FunctionKind::Expression;
        if let FunctionBody::Expr { expr } = &def.body {
            let value: Expr = expr.as_ref().clone();
            let span = value.span();
            def.body = FunctionBody::Block {
                body: Box::new(Stmt::Block {
                    body: vec![Stmt::Return {
                        value: Some(value),
                        span,
                    }],
                    span: def.span,
                }),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::parser::parse_expression;
    use crate::transform::codegen::expr_to_string;

    fn lowered(source: &str) -> String {
        let mut expr = parse_expression(source).unwrap();
        if let Expr::Function { def, .. } = &mut expr {
            Lower.visit_function_mut(Rc::make_mut(def));
        }
        expr_to_string(&expr)
    }

    #[test]
    fn test_concise_body_gets_return() {
        assert_eq!(lowered("(a, b) => a + b"), "function(a, b) { return a + b; }");
    }

    #[test]
    fn test_block_body_is_kept() {
        assert_eq!(lowered("x => { f(x) }"), "function(x) { f(x); }");
    }

    #[test]
    fn test_nested_arrows_are_lowered() {
        assert_eq!(
            lowered("a => b => a"),
            "function(a) { return function(b) { return a; }; }"
        );
    }
}
