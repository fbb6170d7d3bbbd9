//! `` `a${b}c` `` → `"a" + b + "c"`

use std::mem;

use crate::executor::types::ast::{ArithOp, Expr, Module, Span};
use crate::executor::types::visit::{walk_expr_mut, walk_module_mut, VisitorMut};

use super::{Pass, PassContext};

pub struct TemplateLiterals;

impl Pass for TemplateLiterals {
    fn name(&self) -> &'static str {
        "transform-template-literals"
    }

    fn description(&self) -> &'static str {
        "Lower template literals to string concatenation"
    }

    fn apply(&self, module: &mut Module, _cx: &mut PassContext) {
        walk_module_mut(&mut Lower, module);
    }
}

struct Lower;

impl VisitorMut for Lower {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        if let Expr::Template { quasis, exprs, span } = expr {
            let lowered = concat(mem::take(quasis), mem::take(exprs), *span);
            *expr = lowered;
        }
    }
}

fn concat(quasis: Vec<String>, exprs: Vec<Expr>, span: Span) -> Expr {
    let mut parts = Vec::new();
    let mut exprs = exprs.into_iter();
    for quasi in quasis {
        if !quasi.is_empty() {
            parts.push(Expr::string(quasi, span));
        }
        if let Some(e) = exprs.next() {
            parts.push(e);
        }
    }

    // The first operand must be a string so `+` concatenates from the start
    if !matches!(parts.first(), Some(Expr::LitStr { .. })) {
        parts.insert(0, Expr::string("", span));
    }

    let mut parts = parts.into_iter();
    let mut result = parts.next().unwrap_or_else(|| Expr::string("", span));
    for part in parts {
        result = Expr::Arith {
            op: ArithOp::Add,
            left: Box::new(result),
            right: Box::new(part),
            span,
        };
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_expression, parse_module};
    use crate::transform::codegen::{expr_to_string, generate};

    fn lower(source: &str) -> String {
        let mut expr = parse_expression(source).unwrap();
        Lower.visit_expr_mut(&mut expr);
        expr_to_string(&expr)
    }

    #[test]
    fn test_template_becomes_concatenation() {
        assert_eq!(lower("`a${b}c`"), "\"a\" + b + \"c\"");
        assert_eq!(lower("`${a}${b}`"), "\"\" + a + b");
        assert_eq!(lower("`plain`"), "\"plain\"");
        assert_eq!(lower("``"), "\"\"");
    }

    #[test]
    fn test_nested_templates_and_precedence() {
        assert_eq!(lower("`x${a ? `y${b}` : c}`"), "\"x\" + (a ? \"y\" + b : c)");
    }

    #[test]
    fn test_applies_inside_functions() {
        let mut module = parse_module("function f(n) { return `n=${n}` }").unwrap();
        let mut cx = PassContext::new(&module);
        TemplateLiterals.apply(&mut module, &mut cx);
        assert!(generate(&module).code.contains("return \"n=\" + n;"));
    }
}
