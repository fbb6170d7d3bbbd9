//! Experimental syntax gate
//!
//! JSX, `??` and `?.` parse unconditionally, but a program may only use them
//! when some configured pass enables them.

use crate::error::TransformError;
use crate::executor::types::ast::{BinaryOp, Expr, Module, Span};
use crate::executor::types::visit::{walk_expr, walk_module, Visitor};

/// Syntax that needs an enabling pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    Jsx,
    NullishCoalescing,
    OptionalChaining,
}

impl Syntax {
    pub fn name(&self) -> &'static str {
        match self {
            Syntax::Jsx => "jsx",
            Syntax::NullishCoalescing => "nullishCoalescing",
            Syntax::OptionalChaining => "optionalChaining",
        }
    }
}

/// Fail at the first use of syntax `enabled` says no to
pub fn check(module: &Module, enabled: impl Fn(Syntax) -> bool) -> Result<(), TransformError> {
    let first = uses(module)
        .into_iter()
        .filter(|(syntax, _)| !enabled(*syntax))
        .min_by_key(|(_, span)| position(span));

    match first {
        Some((syntax, span)) => Err(TransformError::syntax(
            format!(
                "Support for the experimental syntax '{}' isn't currently enabled",
                syntax.name()
            ),
            Some(span),
        )),
        None => Ok(()),
    }
}

/// Where `syntax` first appears, if anywhere
pub fn first_use(module: &Module, syntax: Syntax) -> Option<Span> {
    uses(module)
        .into_iter()
        .filter(|(found, _)| *found == syntax)
        .map(|(_, span)| span)
        .min_by_key(position)
}

fn uses(module: &Module) -> Vec<(Syntax, Span)> {
    let mut finder = SyntaxFinder::default();
    walk_module(&mut finder, module);
    finder.uses
}

fn position(span: &Span) -> (usize, usize) {
    (span.start_line, span.start_col)
}

#[derive(Default)]
struct SyntaxFinder {
    uses: Vec<(Syntax, Span)>,
}

impl Visitor for SyntaxFinder {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Jsx { span, .. } => self.uses.push((Syntax::Jsx, *span)),
            Expr::BinaryOp {
                op: BinaryOp::Nullish,
                span,
                ..
            } => self.uses.push((Syntax::NullishCoalescing, *span)),
            Expr::Member {
                optional: true,
                property_span,
                ..
            } => self.uses.push((Syntax::OptionalChaining, *property_span)),
            Expr::Index {
                optional: true,
                span,
                ..
            }
            | Expr::Call {
                optional: true,
                span,
                ..
            } => self.uses.push((Syntax::OptionalChaining, *span)),
            _ => {}
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::parser::parse_module;

    #[test]
    fn test_disabled_jsx_is_rejected_at_its_position() {
        let module = parse_module("const a = 1\nconst b = <div />").unwrap();
        let err = check(&module, |_| false).unwrap_err();
        assert_eq!(
            err,
            TransformError::Syntax {
                message: "Support for the experimental syntax 'jsx' isn't currently enabled"
                    .to_string(),
                location: Some(Location::new(2, 11)),
            }
        );
    }

    #[test]
    fn test_enabled_syntax_passes() {
        let module = parse_module("const v = a?.b ?? <p />").unwrap();
        assert!(check(&module, |_| true).is_ok());
    }

    #[test]
    fn test_reports_earliest_offender() {
        let module = parse_module("x ?? y\nconst el = <br />").unwrap();
        let err = check(&module, |_| false).unwrap_err();
        assert!(err.to_string().contains("'nullishCoalescing'"));
    }

    #[test]
    fn test_first_use() {
        let module = parse_module("f()\nlet a = <i />\nlet b = <b />").unwrap();
        let span = first_use(&module, Syntax::Jsx).unwrap();
        assert_eq!((span.start_line, span.start_col), (1, 8));
        assert_eq!(first_use(&module, Syntax::OptionalChaining), None);
    }

    #[test]
    fn test_only_disabled_syntax_counts() {
        let module = parse_module("x ?? y\nconst el = <br />").unwrap();
        let err = check(&module, |s| s == Syntax::NullishCoalescing).unwrap_err();
        assert!(err.to_string().contains("'jsx'"));
    }
}
