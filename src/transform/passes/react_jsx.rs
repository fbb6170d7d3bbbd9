//! JSX → `React.createElement(type, props, ...children)`
//!
//! Lowercase tag names are host components and become strings; capitalised
//! and dotted names are references. Text children are collapsed the way JSX
//! always has: lines are trimmed, blank lines dropped, and the remaining
//! lines joined with a single space.

use crate::executor::types::ast::{
    Expr, JsxAttr, JsxAttrValue, JsxChild, JsxElement, JsxName, Module, ObjProp, Span,
};
use crate::executor::types::visit::{walk_expr_mut, walk_module_mut, VisitorMut};
use crate::transform::gate::Syntax;

use super::{Pass, PassContext};

pub struct ReactJsx;

impl Pass for ReactJsx {
    fn name(&self) -> &'static str {
        "transform-react-jsx"
    }

    fn description(&self) -> &'static str {
        "Lower JSX to React.createElement calls"
    }

    fn enables(&self) -> &'static [Syntax] {
        &[Syntax::Jsx]
    }

    fn apply(&self, module: &mut Module, _cx: &mut PassContext) {
        walk_module_mut(&mut Lower, module);
    }
}

struct Lower;

impl VisitorMut for Lower {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        if let Expr::Jsx { element, .. } = expr {
            let call = create_element(element);
            *expr = call;
        }
    }
}

fn create_element(element: &JsxElement) -> Expr {
    let span = element.span;
    let react = || Expr::ident("React", span);

    let element_type = match &element.name {
        JsxName::Fragment => Expr::member(react(), "Fragment", span),
        JsxName::Name { name } => tag_expr(name, span),
    };

    let props = if element.attrs.is_empty() {
        Expr::LitNull { span }
    } else {
        Expr::LitObj {
            properties: props(&element.attrs),
            span,
        }
    };

    let mut args = vec![element_type, props];
    args.extend(children(&element.children, &create_element));

    Expr::call(Expr::member(react(), "createElement", span), args, span)
}

/* ===================== Shared with the inline-elements pass ===================== */

/// `div` → `"div"`, `Foo` → `Foo`, `Foo.Bar` → `Foo.Bar`
pub(super) fn tag_expr(name: &str, span: Span) -> Expr {
    if name.contains('.') {
        let mut parts = name.split('.');
        let head = parts.next().unwrap_or(name);
        return parts.fold(Expr::ident(head, span), |object, prop| {
            Expr::member(object, prop, span)
        });
    }

    let host = name
        .chars()
        .next()
        .map_or(true, |c| c.is_ascii_lowercase())
        || name.contains('-');
    if host {
        Expr::string(name, span)
    } else {
        Expr::ident(name, span)
    }
}

/// Attributes as object properties; bare attributes are `true`
pub(super) fn props(attrs: &[JsxAttr]) -> Vec<ObjProp> {
    attrs
        .iter()
        .map(|attr| match attr {
            JsxAttr::Spread { expr } => ObjProp::Spread { expr: expr.clone() },
            JsxAttr::Attr {
                name,
                value,
                span: attr_span,
            } => {
                let value = match value {
                    None => Expr::LitBool {
                        v: true,
                        span: *attr_span,
                    },
                    Some(JsxAttrValue::Str { v }) => Expr::string(decode_entities(v), *attr_span),
                    Some(JsxAttrValue::Expr { expr }) => expr.clone(),
                };
                ObjProp::KeyValue {
                    key: name.clone(),
                    key_span: *attr_span,
                    value,
                }
            }
        })
        .collect()
}

/// Children as expressions, with nested elements lowered by `lower_element`
pub(super) fn children(
    children: &[JsxChild],
    lower_element: &dyn Fn(&JsxElement) -> Expr,
) -> Vec<Expr> {
    children
        .iter()
        .filter_map(|child| match child {
            JsxChild::Text { raw, span } => {
                let text = clean_text(raw);
                (!text.is_empty()).then(|| Expr::string(decode_entities(&text), *span))
            }
            JsxChild::Expr { expr, .. } => expr.clone(),
            JsxChild::Element { element } => Some(lower_element(element)),
        })
        .collect()
}

/// Collapse JSX text whitespace
pub(super) fn clean_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.split("\r\n").flat_map(|l| l.split(['\n', '\r'])).collect();

    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'))
        .unwrap_or(0);

    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        let is_first = idx == 0;
        let is_last = idx == lines.len() - 1;

        let mut trimmed = line.replace('\t', " ");
        if !is_first {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if !is_last {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if !trimmed.is_empty() {
            if idx != last_non_empty {
                trimmed.push(' ');
            }
            out.push_str(&trimmed);
        }
    }
    out
}

/// Decode the HTML entities JSX text and attribute strings may contain
pub(super) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[..semi];
            decode_entity(entity).map(|ch| (ch, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    let ch = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "middot" => '\u{b7}',
        "times" => '\u{d7}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "larr" => '\u{2190}',
        "rarr" => '\u{2192}',
        "bull" => '\u{2022}',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;
    use crate::transform::codegen::expr_to_string;

    fn lower(source: &str) -> String {
        let mut expr = parse_expression(source).unwrap();
        Lower.visit_expr_mut(&mut expr);
        expr_to_string(&expr)
    }

    #[test]
    fn test_host_and_component_tags() {
        assert_eq!(lower("<div />"), "React.createElement(\"div\", null)");
        assert_eq!(lower("<Foo />"), "React.createElement(Foo, null)");
        assert_eq!(
            lower("<Foo.Bar x=\"1\" />"),
            "React.createElement(Foo.Bar, { x: \"1\" })"
        );
    }

    #[test]
    fn test_attributes_and_spread() {
        assert_eq!(
            lower("<input disabled value={v} {...rest} data-id=\"a\" />"),
            "React.createElement(\"input\", { disabled: true, value: v, ...rest, \"data-id\": \"a\" })"
        );
    }

    #[test]
    fn test_children_and_fragments() {
        assert_eq!(
            lower("<>\n  <b>hi</b>\n  {name}\n</>"),
            "React.createElement(React.Fragment, null, React.createElement(\"b\", null, \"hi\"), name)"
        );
    }

    #[test]
    fn test_jsx_inside_attribute_expressions() {
        assert_eq!(
            lower("<A icon={<I />} />"),
            "React.createElement(A, { icon: React.createElement(I, null) })"
        );
    }

    #[test]
    fn test_text_whitespace_collapsing() {
        assert_eq!(clean_text("  hello  "), "  hello  ");
        assert_eq!(clean_text("\n  hello\n  world\n"), "hello world");
        assert_eq!(clean_text("\n   \n"), "");
        assert_eq!(clean_text("a \n\n b"), "a b");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(decode_entities("a &amp; b &lt;3 &#65;&#x42; &bogus;"), "a & b <3 AB &bogus;");
    }
}
