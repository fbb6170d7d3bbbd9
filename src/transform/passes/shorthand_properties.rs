//! `{ a }` → `{ a: a }`

use crate::executor::types::ast::{Expr, Module, ObjProp};
use crate::executor::types::visit::{walk_expr_mut, walk_module_mut, VisitorMut};

use super::{Pass, PassContext};

pub struct ShorthandProperties;

impl Pass for ShorthandProperties {
    fn name(&self) -> &'static str {
        "transform-shorthand-properties"
    }

    fn description(&self) -> &'static str {
        "Expand shorthand object properties"
    }

    fn apply(&self, module: &mut Module, _cx: &mut PassContext) {
        walk_module_mut(&mut Expand, module);
    }
}

struct Expand;

impl VisitorMut for Expand {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        if let Expr::LitObj { properties, .. } = expr {
            for prop in properties.iter_mut() {
                if let ObjProp::Shorthand { name, span } = prop {
                    *prop = ObjProp::KeyValue {
                        key: name.clone(),
                        key_span: *span,
                        value: Expr::ident(name.clone(), *span),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;
    use crate::transform::codegen::expr_to_string;

    #[test]
    fn test_shorthand_is_expanded() {
        let mut expr = parse_expression("({ a, b: 1, ...c })").unwrap();
        Expand.visit_expr_mut(&mut expr);
        assert_eq!(expr_to_string(&expr), "{ a: a, b: 1, ...c }");
    }
}
