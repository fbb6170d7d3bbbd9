//! JSX → plain `{ type, props }` element objects
//!
//! Needs no `React` in scope. Children land in `props.children`: a single
//! child as itself, several as an array. Fragments get the type `"Fragment"`.

use crate::executor::types::ast::{Expr, JsxElement, JsxName, ListItem, Module, ObjProp};
use crate::executor::types::visit::{walk_expr_mut, walk_module_mut, VisitorMut};
use crate::transform::gate::Syntax;

use super::react_jsx::{children, props, tag_expr};
use super::{Pass, PassContext};

pub struct ReactInlineElements;

impl Pass for ReactInlineElements {
    fn name(&self) -> &'static str {
        "transform-react-inline-elements"
    }

    fn description(&self) -> &'static str {
        "Lower JSX to inline { type, props } objects"
    }

    fn enables(&self) -> &'static [Syntax] {
        &[Syntax::Jsx]
    }

    fn apply(&self, module: &mut Module, _cx: &mut PassContext) {
        walk_module_mut(&mut Inline, module);
    }
}

struct Inline;

impl VisitorMut for Inline {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        if let Expr::Jsx { element, .. } = expr {
            let object = inline_element(element);
            *expr = object;
        }
    }
}

fn inline_element(element: &JsxElement) -> Expr {
    let span = element.span;

    let element_type = match &element.name {
        JsxName::Fragment => Expr::string("Fragment", span),
        JsxName::Name { name } => tag_expr(name, span),
    };

    let mut properties = props(&element.attrs);
    let mut kids = children(&element.children, &inline_element);
    match kids.len() {
        0 => {}
        1 => properties.push(ObjProp::KeyValue {
            key: "children".to_string(),
            key_span: span,
            value: kids.remove(0),
        }),
        _ => properties.push(ObjProp::KeyValue {
            key: "children".to_string(),
            key_span: span,
            value: Expr::LitList {
                elements: kids.into_iter().map(|expr| ListItem::Item { expr }).collect(),
                span,
            },
        }),
    }

    Expr::LitObj {
        properties: vec![
            ObjProp::KeyValue {
                key: "type".to_string(),
                key_span: span,
                value: element_type,
            },
            ObjProp::KeyValue {
                key: "props".to_string(),
                key_span: span,
                value: Expr::LitObj { properties, span },
            },
        ],
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;
    use crate::transform::codegen::expr_to_string;

    fn inline(source: &str) -> String {
        let mut expr = parse_expression(source).unwrap();
        Inline.visit_expr_mut(&mut expr);
        expr_to_string(&expr)
    }

    #[test]
    fn test_element_without_children() {
        assert_eq!(
            inline("<img src=\"a.png\" />"),
            "{ type: \"img\", props: { src: \"a.png\" } }"
        );
    }

    #[test]
    fn test_single_child_is_not_wrapped() {
        assert_eq!(
            inline("<Title>Hello</Title>"),
            "{ type: Title, props: { children: \"Hello\" } }"
        );
    }

    #[test]
    fn test_many_children_become_an_array() {
        assert_eq!(
            inline("<>{a}<i /></>"),
            "{ type: \"Fragment\", props: { children: [a, { type: \"i\", props: {} }] } }"
        );
    }
}
