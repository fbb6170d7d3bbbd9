//! Parser - PEST-based parser for the module dialect
//!
//! Produces the AST shared by the transform passes and the sandbox evaluator,
//! with span information on every node for error reporting and source maps.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::rc::Rc;

use crate::executor::types::ast::{
    ArithOp, BinaryOp, CatchClause, DeclareTarget, Declarator, DestructureField, ExportSpecifier,
    Expr, ForLoopKind, FunctionBody, FunctionDef, FunctionKind, ImportSpecifier, JsxAttr,
    JsxAttrValue, JsxChild, JsxElement, JsxName, ListItem, MemberAccess, Module, ObjProp, Param,
    Span, Stmt, UnaryOp, VarKind,
};

#[cfg(test)]
mod tests;

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/source.pest"]
struct SourceParser;

/* ===================== Error Types ===================== */

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Grammar mismatch reported by pest, with its rendered code frame
    PestError {
        message: String,
        frame: String,
        span: Option<Span>,
    },
    /// Input matched the grammar but is not a valid program
    BuildError(String, Option<Span>),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::PestError { span, .. } => *span,
            ParseError::BuildError(_, span) => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::PestError { message, .. } => message,
            ParseError::BuildError(msg, _) => msg,
        }
    }

    /// Code frame pointing at the error, when pest produced one
    pub fn frame(&self) -> Option<&str> {
        match self {
            ParseError::PestError { frame, .. } => Some(frame),
            ParseError::BuildError(..) => None,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ParseError {}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let err = err.renamed_rules(rule_label);
        let span = match err.line_col {
            pest::error::LineColLocation::Pos((line, col)) => Some(Span {
                start: 0,
                end: 0,
                start_line: line.saturating_sub(1),
                start_col: col.saturating_sub(1),
                end_line: line.saturating_sub(1),
                end_col: col,
            }),
            pest::error::LineColLocation::Span((start_line, start_col), (end_line, end_col)) => {
                Some(Span {
                    start: 0,
                    end: 0,
                    start_line: start_line.saturating_sub(1),
                    start_col: start_col.saturating_sub(1),
                    end_line: end_line.saturating_sub(1),
                    end_col: end_col.saturating_sub(1),
                })
            }
        };
        ParseError::PestError {
            message: format!("Unexpected token, {}", err.variant.message()),
            frame: err.to_string(),
            span,
        }
    }
}

/// Human-readable rule names for pest's "expected ..." messages
fn rule_label(rule: &Rule) -> String {
    match rule {
        Rule::EOI => "end of input".to_string(),
        Rule::assign_op => "\"=\"".to_string(),
        Rule::var_kind => "\"const\", \"let\" or \"var\"".to_string(),
        Rule::op_nullish => "\"??\"".to_string(),
        Rule::op_or => "\"||\"".to_string(),
        Rule::op_and => "\"&&\"".to_string(),
        Rule::op_seq => "\"===\"".to_string(),
        Rule::op_sne => "\"!==\"".to_string(),
        Rule::op_eq => "\"==\"".to_string(),
        Rule::op_ne => "\"!=\"".to_string(),
        Rule::op_lte => "\"<=\"".to_string(),
        Rule::op_gte => "\">=\"".to_string(),
        Rule::op_lt => "\"<\"".to_string(),
        Rule::op_gt => "\">\"".to_string(),
        Rule::op_add | Rule::op_plus => "\"+\"".to_string(),
        Rule::op_sub | Rule::op_neg => "\"-\"".to_string(),
        Rule::op_mul => "\"*\"".to_string(),
        Rule::op_div => "\"/\"".to_string(),
        Rule::op_mod => "\"%\"".to_string(),
        other => {
            let name = format!("{:?}", other);
            match name.strip_prefix("kw_") {
                Some(word) => format!("\"{}\"", word),
                None => name.replace('_', " "),
            }
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Span Helpers ===================== */

/// Source text with a line index for offset to line/column conversion
struct Source<'s> {
    text: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> Source<'s> {
    fn new(text: &'s str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { text, line_starts }
    }

    /// Convert byte offset to (line, column) - 0-indexed, column counted in chars
    fn offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let col = self
            .text
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        (line, col)
    }
}

/// Convert a PEST pair's span to our Span type
fn pair_to_span(pair: &Pair<Rule>, src: &Source) -> Span {
    let pest_span = pair.as_span();
    let start = pest_span.start();
    let end = pest_span.end();

    let (start_line, start_col) = src.offset_to_line_col(start);
    let (end_line, end_col) = src.offset_to_line_col(end);

    Span::new(start, end, start_line, start_col, end_line, end_col)
}

/// Keyword tokens are matched atomically and carry no information of their own
fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_import
            | Rule::kw_export
            | Rule::kw_from
            | Rule::kw_as
            | Rule::kw_default
            | Rule::kw_function
            | Rule::kw_return
            | Rule::kw_if
            | Rule::kw_else
            | Rule::kw_while
            | Rule::kw_for
            | Rule::kw_try
            | Rule::kw_catch
            | Rule::kw_finally
            | Rule::kw_throw
            | Rule::kw_break
            | Rule::kw_continue
            | Rule::kw_new
    )
}

/// Inner pairs of a rule with keyword tokens filtered out
fn children(pair: Pair<Rule>) -> std::vec::IntoIter<Pair<Rule>> {
    pair.into_inner()
        .filter(|p| !is_keyword(p.as_rule()))
        .collect::<Vec<_>>()
        .into_iter()
}

/// Take the next pair, failing with a build error if the tree is shorter than expected
fn next_pair<'i>(
    pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
    what: &str,
    span: Span,
) -> ParseResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| ParseError::BuildError(format!("Expected {}", what), Some(span)))
}

/// Words that cannot be used as binding names
pub fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "let"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
    )
}

/* ===================== Public API ===================== */

/// Parse a source string into a module
pub fn parse_module(source: &str) -> ParseResult<Module> {
    let src = Source::new(source);
    let mut pairs = SourceParser::parse(Rule::program, source)?;

    let program = next_pair(&mut pairs, "program", Span::default())?;
    let span = pair_to_span(&program, &src);
    let body = build_statements(program.into_inner(), &src)?;

    Ok(Module { body, span })
}

/// Parse a single expression (testing and tooling API)
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let module = parse_module(source)?;
    match module.body.into_iter().next() {
        Some(Stmt::Expr { expr, .. }) => Ok(expr),
        other => Err(ParseError::BuildError(
            format!("Expected an expression, got {:?}", other),
            None,
        )),
    }
}

/* ===================== Statement Builders ===================== */

fn build_statements<'i>(
    pairs: impl Iterator<Item = Pair<'i, Rule>>,
    src: &Source,
) -> ParseResult<Vec<Stmt>> {
    let mut statements = Vec::new();
    for pair in pairs {
        if pair.as_rule() != Rule::statement {
            continue;
        }
        let span = pair_to_span(&pair, src);
        let inner = next_pair(&mut pair.into_inner(), "statement", span)?;
        if inner.as_rule() == Rule::empty_stmt {
            continue;
        }
        statements.push(build_statement(inner, src)?);
    }
    Ok(statements)
}

fn build_statement(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);

    match pair.as_rule() {
        Rule::statement => {
            let inner = next_pair(&mut pair.into_inner(), "statement", span)?;
            build_statement(inner, src)
        }
        Rule::empty_stmt => Ok(Stmt::Block {
            body: vec![],
            span,
        }),
        Rule::import_stmt => build_import_stmt(pair, src),
        Rule::export_stmt => build_export_stmt(pair, src),
        Rule::function_decl => {
            let def = build_function(pair, FunctionKind::Declaration, src)?;
            Ok(Stmt::Function {
                def: Rc::new(def),
                span,
            })
        }
        Rule::declare_stmt => {
            let decl = next_pair(&mut pair.into_inner(), "declaration", span)?;
            build_declaration(decl, src)
        }
        Rule::declaration => build_declaration(pair, src),
        Rule::if_stmt => build_if_stmt(pair, src),
        Rule::while_stmt => build_while_stmt(pair, src),
        Rule::for_loop_stmt => build_for_loop_stmt(pair, src),
        Rule::for_stmt => build_for_stmt(pair, src),
        Rule::try_stmt => build_try_stmt(pair, src),
        Rule::return_stmt => {
            let value = match children(pair).next() {
                Some(expr_pair) => Some(build_expression(expr_pair, src)?),
                None => None,
            };
            Ok(Stmt::Return { value, span })
        }
        Rule::throw_stmt => {
            let expr_pair = next_pair(&mut children(pair), "expression", span)?;
            let value = build_expression(expr_pair, src)?;
            Ok(Stmt::Throw { value, span })
        }
        Rule::break_stmt => Ok(Stmt::Break { span }),
        Rule::continue_stmt => Ok(Stmt::Continue { span }),
        Rule::block => build_block(pair, src),
        Rule::assign_stmt | Rule::update_stmt => {
            let clause = next_pair(&mut pair.into_inner(), "assignment", span)?;
            build_assign_clause(clause, span, src)
        }
        Rule::assign_clause | Rule::update_clause => build_assign_clause(pair, span, src),
        Rule::expr_stmt => {
            let expr_pair = next_pair(&mut pair.into_inner(), "expression", span)?;
            let expr = build_expression(expr_pair, src)?;
            Ok(Stmt::Expr { expr, span })
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected statement rule: {:?}", pair.as_rule()),
            Some(span),
        )),
    }
}

fn build_block(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let body = build_statements(pair.into_inner(), src)?;
    Ok(Stmt::Block { body, span })
}

fn build_import_stmt(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let mut specifiers = Vec::new();
    let mut source = None;

    for child in children(pair) {
        match child.as_rule() {
            Rule::import_clause => {
                for part in child.into_inner() {
                    build_import_part(part, &mut specifiers, src)?;
                }
            }
            Rule::string => source = Some(build_string_value(child, src)?),
            _ => {}
        }
    }

    let source = source
        .ok_or_else(|| ParseError::BuildError("Expected module specifier".into(), Some(span)))?;
    Ok(Stmt::Import {
        specifiers,
        source,
        span,
    })
}

fn build_import_part(
    pair: Pair<Rule>,
    specifiers: &mut Vec<ImportSpecifier>,
    src: &Source,
) -> ParseResult<()> {
    let span = pair_to_span(&pair, src);
    match pair.as_rule() {
        Rule::import_default => {
            let id = next_pair(&mut pair.into_inner(), "identifier", span)?;
            specifiers.push(ImportSpecifier::Default {
                local: id.as_str().to_string(),
                span,
            });
        }
        Rule::import_namespace => {
            let id = next_pair(&mut children(pair), "identifier", span)?;
            specifiers.push(ImportSpecifier::Namespace {
                local: id.as_str().to_string(),
                span,
            });
        }
        Rule::import_named => {
            for spec in pair.into_inner() {
                let spec_span = pair_to_span(&spec, src);
                let mut inner = children(spec);
                let imported = next_pair(&mut inner, "imported name", spec_span)?
                    .as_str()
                    .to_string();
                let local = match inner.next() {
                    Some(alias) => alias.as_str().to_string(),
                    None => {
                        if is_reserved_word(&imported) {
                            return Err(ParseError::BuildError(
                                format!("Unexpected keyword '{}'", imported),
                                Some(spec_span),
                            ));
                        }
                        imported.clone()
                    }
                };
                specifiers.push(ImportSpecifier::Named {
                    imported,
                    local,
                    span: spec_span,
                });
            }
        }
        other => {
            return Err(ParseError::BuildError(
                format!("Unexpected import clause rule: {:?}", other),
                Some(span),
            ))
        }
    }
    Ok(())
}

fn build_export_stmt(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let body = next_pair(&mut children(pair), "export body", span)?;

    match body.as_rule() {
        Rule::export_default => {
            let inner = next_pair(&mut children(body), "export default value", span)?;
            if inner.as_rule() == Rule::function_decl {
                let decl = build_statement(inner, src)?;
                Ok(Stmt::ExportDecl {
                    decl: Box::new(decl),
                    default: true,
                    span,
                })
            } else {
                let value = build_expression(inner, src)?;
                Ok(Stmt::ExportDefault { value, span })
            }
        }
        Rule::export_named => {
            let mut specifiers = Vec::new();
            for spec in body.into_inner() {
                let spec_span = pair_to_span(&spec, src);
                let mut inner = children(spec);
                let local = next_pair(&mut inner, "local name", spec_span)?
                    .as_str()
                    .to_string();
                let exported = match inner.next() {
                    Some(alias) => alias.as_str().to_string(),
                    None => local.clone(),
                };
                specifiers.push(ExportSpecifier {
                    local,
                    exported,
                    span: spec_span,
                });
            }
            Ok(Stmt::ExportNamed { specifiers, span })
        }
        Rule::export_decl => {
            let inner = next_pair(&mut body.into_inner(), "declaration", span)?;
            let decl = build_statement(inner, src)?;
            Ok(Stmt::ExportDecl {
                decl: Box::new(decl),
                default: false,
                span,
            })
        }
        other => Err(ParseError::BuildError(
            format!("Unexpected export rule: {:?}", other),
            Some(span),
        )),
    }
}

fn build_function(pair: Pair<Rule>, kind: FunctionKind, src: &Source) -> ParseResult<FunctionDef> {
    let span = pair_to_span(&pair, src);
    let mut name = None;
    let mut params = Vec::new();
    let mut body = None;

    for child in children(pair) {
        match child.as_rule() {
            Rule::identifier => name = Some(child.as_str().to_string()),
            Rule::param_list => params = build_param_list(child, src)?,
            Rule::block => body = Some(build_block(child, src)?),
            _ => {}
        }
    }

    let body = body.ok_or_else(|| {
        ParseError::BuildError("Expected function body".to_string(), Some(span))
    })?;

    Ok(FunctionDef {
        name,
        kind,
        params,
        body: FunctionBody::Block {
            body: Box::new(body),
        },
        span,
    })
}

fn build_param_list(pair: Pair<Rule>, src: &Source) -> ParseResult<Vec<Param>> {
    pair.into_inner()
        .map(|param_pair| {
            let span = pair_to_span(&param_pair, src);
            let mut inner = param_pair.into_inner();
            let target = build_declare_target(next_pair(&mut inner, "parameter", span)?, src)?;
            let default = match inner.next() {
                Some(expr_pair) => Some(build_expression(expr_pair, src)?),
                None => None,
            };
            Ok(Param { target, default })
        })
        .collect()
}

fn build_declaration(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let mut inner = pair.into_inner();

    let kind_pair = next_pair(&mut inner, "declaration kind", span)?;
    let var_kind = match kind_pair.as_str() {
        "let" => VarKind::Let,
        "const" => VarKind::Const,
        "var" => VarKind::Var,
        other => {
            return Err(ParseError::BuildError(
                format!("Expected 'let', 'const' or 'var', got: {}", other),
                Some(pair_to_span(&kind_pair, src)),
            ))
        }
    };

    let mut decls = Vec::new();
    for declarator in inner {
        let decl_span = pair_to_span(&declarator, src);
        let mut parts = declarator.into_inner();
        let target = build_declare_target(next_pair(&mut parts, "binding", decl_span)?, src)?;
        let init = match parts.next() {
            Some(expr_pair) => Some(build_expression(expr_pair, src)?),
            None => None,
        };

        if init.is_none() {
            if matches!(target, DeclareTarget::Destructure { .. }) {
                return Err(ParseError::BuildError(
                    "Missing initializer in destructuring declaration".to_string(),
                    Some(decl_span),
                ));
            }
            if var_kind == VarKind::Const {
                return Err(ParseError::BuildError(
                    "Missing initializer in const declaration".to_string(),
                    Some(decl_span),
                ));
            }
        }

        decls.push(Declarator {
            target,
            init,
            span: decl_span,
        });
    }

    Ok(Stmt::Declare {
        var_kind,
        decls,
        span,
    })
}

fn build_declare_target(pair: Pair<Rule>, src: &Source) -> ParseResult<DeclareTarget> {
    let span = pair_to_span(&pair, src);
    let inner = next_pair(&mut pair.into_inner(), "binding", span)?;
    let inner_span = pair_to_span(&inner, src);

    match inner.as_rule() {
        Rule::identifier => Ok(DeclareTarget::Simple {
            name: inner.as_str().to_string(),
            span: inner_span,
        }),
        Rule::destructure_pattern => {
            let mut fields = Vec::new();
            for field in inner.into_inner() {
                let field_span = pair_to_span(&field, src);
                let mut parts = field.into_inner();
                let key = next_pair(&mut parts, "property name", field_span)?
                    .as_str()
                    .to_string();
                let mut local = None;
                let mut default = None;
                for part in parts {
                    match part.as_rule() {
                        Rule::identifier => local = Some(part.as_str().to_string()),
                        Rule::expression => default = Some(build_expression(part, src)?),
                        _ => {}
                    }
                }
                let local = match local {
                    Some(local) => local,
                    None if is_reserved_word(&key) => {
                        return Err(ParseError::BuildError(
                            format!("Unexpected keyword '{}'", key),
                            Some(field_span),
                        ))
                    }
                    None => key.clone(),
                };
                fields.push(DestructureField {
                    key,
                    local,
                    default,
                    span: field_span,
                });
            }
            Ok(DeclareTarget::Destructure {
                fields,
                span: inner_span,
            })
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected declare target rule: {:?}", inner.as_rule()),
            Some(inner_span),
        )),
    }
}

fn build_if_stmt(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let mut inner = children(pair);

    let test = build_expression(next_pair(&mut inner, "condition", span)?, src)?;
    let then_s = build_statement(next_pair(&mut inner, "statement", span)?, src)?;

    let else_s = match inner.next() {
        Some(else_clause) => {
            let else_inner = next_pair(&mut children(else_clause), "statement", span)?;
            Some(Box::new(build_statement(else_inner, src)?))
        }
        None => None,
    };

    Ok(Stmt::If {
        test,
        then_s: Box::new(then_s),
        else_s,
        span,
    })
}

fn build_while_stmt(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let mut inner = children(pair);

    let test = build_expression(next_pair(&mut inner, "condition", span)?, src)?;
    let body = build_statement(next_pair(&mut inner, "loop body", span)?, src)?;

    Ok(Stmt::While {
        test,
        body: Box::new(body),
        span,
    })
}

fn build_for_loop_stmt(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let mut inner = children(pair);

    let kind_pair = next_pair(&mut inner, "declaration kind", span)?;
    let var_kind = match kind_pair.as_str() {
        "let" => VarKind::Let,
        "const" => VarKind::Const,
        _ => VarKind::Var,
    };

    let binding_pair = next_pair(&mut inner, "loop binding", span)?;
    let binding_span = pair_to_span(&binding_pair, src);
    let binding = binding_pair.as_str().to_string();

    let kind_pair = next_pair(&mut inner, "'of' or 'in'", span)?;
    let kind = match kind_pair.as_str() {
        "of" => ForLoopKind::Of,
        "in" => ForLoopKind::In,
        other => {
            return Err(ParseError::BuildError(
                format!("Expected 'of' or 'in', got: {}", other),
                Some(pair_to_span(&kind_pair, src)),
            ))
        }
    };

    let iterable = build_expression(next_pair(&mut inner, "iterable", span)?, src)?;
    let body = build_statement(next_pair(&mut inner, "loop body", span)?, src)?;

    Ok(Stmt::ForLoop {
        kind,
        var_kind,
        binding,
        binding_span,
        iterable,
        body: Box::new(body),
        span,
    })
}

fn build_for_stmt(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;

    for child in children(pair) {
        let child_span = pair_to_span(&child, src);
        match child.as_rule() {
            Rule::for_init => {
                let clause = next_pair(&mut child.into_inner(), "loop initializer", child_span)?;
                init = Some(Box::new(build_statement(clause, src)?));
            }
            Rule::for_test => {
                let expr = next_pair(&mut child.into_inner(), "loop condition", child_span)?;
                test = Some(build_expression(expr, src)?);
            }
            Rule::for_update => {
                let clause = next_pair(&mut child.into_inner(), "loop update", child_span)?;
                update = Some(Box::new(build_statement(clause, src)?));
            }
            _ => body = Some(build_statement(child, src)?),
        }
    }

    let body =
        body.ok_or_else(|| ParseError::BuildError("Expected loop body".into(), Some(span)))?;
    Ok(Stmt::For {
        init,
        test,
        update,
        body: Box::new(body),
        span,
    })
}

fn build_try_stmt(pair: Pair<Rule>, src: &Source) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, src);
    let mut inner = children(pair);

    let body = build_block(next_pair(&mut inner, "try block", span)?, src)?;
    let mut catch = None;
    let mut finally = None;

    for clause in inner {
        let clause_span = pair_to_span(&clause, src);
        match clause.as_rule() {
            Rule::catch_clause => {
                let mut var = None;
                let mut catch_body = None;
                for part in children(clause) {
                    match part.as_rule() {
                        Rule::identifier => var = Some(part.as_str().to_string()),
                        Rule::block => catch_body = Some(build_block(part, src)?),
                        _ => {}
                    }
                }
                let catch_body = catch_body.ok_or_else(|| {
                    ParseError::BuildError("Expected catch block".into(), Some(clause_span))
                })?;
                catch = Some(CatchClause {
                    var,
                    body: Box::new(catch_body),
                    span: clause_span,
                });
            }
            Rule::finally_clause => {
                let block = next_pair(&mut children(clause), "finally block", clause_span)?;
                finally = Some(Box::new(build_block(block, src)?));
            }
            _ => {}
        }
    }

    if catch.is_none() && finally.is_none() {
        return Err(ParseError::BuildError(
            "Missing catch or finally clause".to_string(),
            Some(span),
        ));
    }

    Ok(Stmt::Try {
        body: Box::new(body),
        catch,
        finally,
        span,
    })
}

/// Build `target op= value` or `target++` into a plain assignment
fn build_assign_clause(pair: Pair<Rule>, span: Span, src: &Source) -> ParseResult<Stmt> {
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();

    let target_pair = next_pair(&mut inner, "assignment target", span)?;
    let (var, var_span, path) = build_assign_target(target_pair, src)?;

    let op_pair = next_pair(&mut inner, "assignment operator", span)?;
    let op = op_pair.as_str();

    let value = if rule == Rule::update_clause {
        let arith = if op == "++" { ArithOp::Add } else { ArithOp::Sub };
        Expr::Arith {
            op: arith,
            left: Box::new(target_to_expr(&var, var_span, &path)),
            right: Box::new(Expr::LitNum {
                v: 1.0,
                span: pair_to_span(&op_pair, src),
            }),
            span,
        }
    } else {
        let rhs = build_expression(next_pair(&mut inner, "expression", span)?, src)?;
        let compound = match op {
            "+=" => Some(ArithOp::Add),
            "-=" => Some(ArithOp::Sub),
            "*=" => Some(ArithOp::Mul),
            "/=" => Some(ArithOp::Div),
            "%=" => Some(ArithOp::Mod),
            _ => None,
        };
        match compound {
            Some(arith) => {
                let rhs_span = rhs.span();
                Expr::Arith {
                    op: arith,
                    left: Box::new(target_to_expr(&var, var_span, &path)),
                    right: Box::new(rhs),
                    span: var_span.merge(&rhs_span),
                }
            }
            None => rhs,
        }
    };

    Ok(Stmt::Assign {
        var,
        var_span,
        path,
        value,
        span,
    })
}

fn build_assign_target(
    pair: Pair<Rule>,
    src: &Source,
) -> ParseResult<(String, Span, Vec<MemberAccess>)> {
    let span = pair_to_span(&pair, src);
    let mut inner = pair.into_inner();

    let var_pair = next_pair(&mut inner, "identifier", span)?;
    let var_span = pair_to_span(&var_pair, src);
    let var = var_pair.as_str().to_string();

    let mut path = Vec::new();
    for segment in inner {
        let segment_span = pair_to_span(&segment, src);
        let segment_inner = next_pair(&mut segment.into_inner(), "member", segment_span)?;
        match segment_inner.as_rule() {
            Rule::property_name => path.push(MemberAccess::Prop {
                property: segment_inner.as_str().to_string(),
                span: segment_span,
            }),
            Rule::expression => path.push(MemberAccess::Index {
                expr: build_expression(segment_inner, src)?,
                span: segment_span,
            }),
            other => {
                return Err(ParseError::BuildError(
                    format!("Unexpected assignment path rule: {:?}", other),
                    Some(segment_span),
                ))
            }
        }
    }

    Ok((var, var_span, path))
}

/// Rebuild the read side of an assignment target (`a.b[c]`)
pub fn target_to_expr(var: &str, var_span: Span, path: &[MemberAccess]) -> Expr {
    let mut expr = Expr::ident(var, var_span);
    for segment in path {
        expr = match segment {
            MemberAccess::Prop { property, span } => Expr::Member {
                span: expr.span().merge(span),
                object: Box::new(expr),
                property: property.clone(),
                property_span: *span,
                optional: false,
            },
            MemberAccess::Index { expr: index, span } => Expr::Index {
                span: expr.span().merge(span),
                object: Box::new(expr),
                index: Box::new(index.clone()),
                optional: false,
            },
        };
    }
    expr
}

/* ===================== Expression Builders ===================== */

fn build_binary_expr(pair: Pair<Rule>, src: &Source) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, src);
    let inner_pairs: Vec<_> = pair.into_inner().collect();

    if inner_pairs.is_empty() {
        return Err(ParseError::BuildError(
            "Empty binary expression".to_string(),
            Some(span),
        ));
    }

    let mut left = build_expression(inner_pairs[0].clone(), src)?;

    let mut i = 1;
    while i < inner_pairs.len() {
        let op_rule = inner_pairs[i].as_rule();

        i += 1;
        if i >= inner_pairs.len() {
            return Err(ParseError::BuildError(
                "Missing right operand after operator".to_string(),
                Some(span),
            ));
        }

        let right = build_expression(inner_pairs[i].clone(), src)?;
        let new_span = left.span().merge(&right.span());

        let short_circuit = match op_rule {
            Rule::op_and => Some(BinaryOp::And),
            Rule::op_or => Some(BinaryOp::Or),
            Rule::op_nullish => Some(BinaryOp::Nullish),
            _ => None,
        };

        left = match short_circuit {
            Some(op) => Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span: new_span,
            },
            None => {
                let op = match op_rule {
                    Rule::op_seq => ArithOp::StrictEq,
                    Rule::op_sne => ArithOp::StrictNe,
                    Rule::op_eq => ArithOp::Eq,
                    Rule::op_ne => ArithOp::Ne,
                    Rule::op_lt => ArithOp::Lt,
                    Rule::op_lte => ArithOp::Lte,
                    Rule::op_gt => ArithOp::Gt,
                    Rule::op_gte => ArithOp::Gte,
                    Rule::op_add => ArithOp::Add,
                    Rule::op_sub => ArithOp::Sub,
                    Rule::op_mul => ArithOp::Mul,
                    Rule::op_div => ArithOp::Div,
                    Rule::op_mod => ArithOp::Mod,
                    _ => {
                        return Err(ParseError::BuildError(
                            format!(
                                "Expected operator rule at index {}, got {:?}",
                                i - 1,
                                op_rule
                            ),
                            Some(span),
                        ))
                    }
                };
                Expr::Arith {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span: new_span,
                }
            }
        };

        i += 1;
    }

    Ok(left)
}

fn build_expression(pair: Pair<Rule>, src: &Source) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, src);

    match pair.as_rule() {
        Rule::expression | Rule::primary | Rule::literal => {
            let inner = next_pair(&mut children(pair), "expression", span)?;
            build_expression(inner, src)
        }
        Rule::arrow_function => build_arrow_function(pair, src),
        Rule::ternary_expr => {
            let mut inner = pair.into_inner();
            let condition = build_expression(next_pair(&mut inner, "condition", span)?, src)?;

            if let Some(consequent_pair) = inner.next() {
                let consequent = build_expression(consequent_pair, src)?;
                let alternate = build_expression(next_pair(&mut inner, "':'", span)?, src)?;
                Ok(Expr::Ternary {
                    condition: Box::new(condition),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                    span,
                })
            } else {
                Ok(condition)
            }
        }
        Rule::nullish_expr
        | Rule::logical_or_expr
        | Rule::logical_and_expr
        | Rule::equality_expr
        | Rule::comparison_expr
        | Rule::additive_expr
        | Rule::multiplicative_expr => build_binary_expr(pair, src),
        Rule::unary_expr => {
            let inner: Vec<_> = pair.into_inner().collect();
            let Some((operand_pair, ops)) = inner.split_last() else {
                return Err(ParseError::BuildError(
                    "Empty unary expression".to_string(),
                    Some(span),
                ));
            };
            let mut expr = build_expression(operand_pair.clone(), src)?;
            for op_pair in ops.iter().rev() {
                let op_span = pair_to_span(op_pair, src).merge(&expr.span());
                let op = match op_pair.as_rule() {
                    Rule::op_not => UnaryOp::Not,
                    Rule::op_neg => UnaryOp::Neg,
                    Rule::op_plus => UnaryOp::Plus,
                    _ => UnaryOp::TypeOf,
                };
                expr = match (op, expr) {
                    (UnaryOp::Neg, Expr::LitNum { v, .. }) => Expr::LitNum {
                        v: -v,
                        span: op_span,
                    },
                    (op, operand) => Expr::Unary {
                        op,
                        operand: Box::new(operand),
                        span: op_span,
                    },
                };
            }
            Ok(expr)
        }
        Rule::postfix_expr => build_postfix_expr(pair, src),
        Rule::function_expr => {
            let def = build_function(pair, FunctionKind::Expression, src)?;
            Ok(Expr::Function {
                def: Rc::new(def),
                span,
            })
        }
        Rule::template_literal => build_template_literal(pair, src),
        Rule::identifier => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
            span,
        }),
        Rule::number => Ok(Expr::LitNum {
            v: parse_number(pair.as_str(), span)?,
            span,
        }),
        Rule::boolean => Ok(Expr::LitBool {
            v: pair.as_str() == "true",
            span,
        }),
        Rule::string => Ok(Expr::LitStr {
            v: build_string_value(pair, src)?,
            span,
        }),
        Rule::null_lit => Ok(Expr::LitNull { span }),
        Rule::undefined_lit => Ok(Expr::Ident {
            name: "undefined".to_string(),
            span,
        }),
        Rule::new_expr => {
            let mut inner = children(pair);
            let id = next_pair(&mut inner, "constructor", span)?;
            let mut callee = Expr::ident(id.as_str(), pair_to_span(&id, src));
            let mut args = Vec::new();
            for part in inner {
                let part_span = pair_to_span(&part, src);
                match part.as_rule() {
                    Rule::regular_access => {
                        let prop = next_pair(&mut part.into_inner(), "property", part_span)?;
                        callee = Expr::Member {
                            span: callee.span().merge(&part_span),
                            object: Box::new(callee),
                            property: prop.as_str().to_string(),
                            property_span: pair_to_span(&prop, src),
                            optional: false,
                        };
                    }
                    Rule::call_suffix => {
                        if let Some(arg_list) = part.into_inner().next() {
                            args = build_arg_list(arg_list, src)?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Expr::New {
                callee: Box::new(callee),
                args,
                span,
            })
        }
        Rule::object_lit => build_object_literal(pair, src),
        Rule::array_lit => build_array_literal(pair, src),
        Rule::jsx_element => {
            let element = build_jsx_element(pair, src)?;
            Ok(Expr::Jsx {
                element: Box::new(element),
                span,
            })
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected expression rule: {:?}", pair.as_rule()),
            Some(span),
        )),
    }
}

fn build_arrow_function(pair: Pair<Rule>, src: &Source) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, src);
    let mut inner = pair.into_inner();

    let params_pair = next_pair(&mut inner, "arrow parameters", span)?;
    let params = match params_pair.into_inner().next() {
        None => vec![],
        Some(p) if p.as_rule() == Rule::identifier => vec![Param {
            target: DeclareTarget::Simple {
                name: p.as_str().to_string(),
                span: pair_to_span(&p, src),
            },
            default: None,
        }],
        Some(p) => build_param_list(p, src)?,
    };

    let body_pair = next_pair(&mut inner, "arrow body", span)?;
    let body_inner = next_pair(&mut body_pair.into_inner(), "arrow body", span)?;
    let body = if body_inner.as_rule() == Rule::block {
        FunctionBody::Block {
            body: Box::new(build_block(body_inner, src)?),
        }
    } else {
        FunctionBody::Expr {
            expr: Box::new(build_expression(body_inner, src)?),
        }
    };

    Ok(Expr::Function {
        def: Rc::new(FunctionDef {
            name: None,
            kind: FunctionKind::Arrow,
            params,
            body,
            span,
        }),
        span,
    })
}

fn build_postfix_expr(pair: Pair<Rule>, src: &Source) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, src);
    let mut inner = pair.into_inner();
    let mut expr = build_expression(next_pair(&mut inner, "expression", span)?, src)?;

    for postfix_pair in inner {
        let postfix_span = pair_to_span(&postfix_pair, src);
        let postfix_inner = next_pair(&mut postfix_pair.into_inner(), "member", postfix_span)?;
        let new_span = expr.span().merge(&postfix_span);
        let rule = postfix_inner.as_rule();

        expr = match rule {
            Rule::call_suffix | Rule::optional_call => {
                let args = match postfix_inner.into_inner().next() {
                    Some(arg_list) => build_arg_list(arg_list, src)?,
                    None => vec![],
                };
                Expr::Call {
                    callee: Box::new(expr),
                    args,
                    optional: rule == Rule::optional_call,
                    span: new_span,
                }
            }
            Rule::optional_access | Rule::regular_access => {
                let prop_pair = next_pair(&mut postfix_inner.into_inner(), "property", span)?;
                Expr::Member {
                    object: Box::new(expr),
                    property: prop_pair.as_str().to_string(),
                    property_span: pair_to_span(&prop_pair, src),
                    optional: rule == Rule::optional_access,
                    span: new_span,
                }
            }
            Rule::optional_index | Rule::index_access => {
                let index_pair = next_pair(&mut postfix_inner.into_inner(), "index", span)?;
                Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(build_expression(index_pair, src)?),
                    optional: rule == Rule::optional_index,
                    span: new_span,
                }
            }
            other => {
                return Err(ParseError::BuildError(
                    format!("Unexpected postfix rule: {:?}", other),
                    Some(postfix_span),
                ))
            }
        };
    }

    Ok(expr)
}

fn build_arg_list(pair: Pair<Rule>, src: &Source) -> ParseResult<Vec<Expr>> {
    pair.into_inner()
        .map(|expr_pair| build_expression(expr_pair, src))
        .collect()
}

fn build_template_literal(pair: Pair<Rule>, src: &Source) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, src);
    let mut quasis = Vec::new();
    let mut exprs = Vec::new();
    let mut current = String::new();

    for part in pair.into_inner() {
        let part_span = pair_to_span(&part, src);
        match part.as_rule() {
            Rule::template_chars => current.push_str(&unescape(part.as_str(), part_span)?),
            Rule::template_subst => {
                quasis.push(std::mem::take(&mut current));
                let expr_pair = next_pair(&mut part.into_inner(), "expression", part_span)?;
                exprs.push(build_expression(expr_pair, src)?);
            }
            _ => {}
        }
    }
    quasis.push(current);

    Ok(Expr::Template {
        quasis,
        exprs,
        span,
    })
}

fn build_object_literal(pair: Pair<Rule>, src: &Source) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, src);
    let properties = pair
        .into_inner()
        .map(|property_pair| build_property(property_pair, src))
        .collect::<ParseResult<Vec<_>>>()?;

    Ok(Expr::LitObj { properties, span })
}

fn build_property(pair: Pair<Rule>, src: &Source) -> ParseResult<ObjProp> {
    let span = pair_to_span(&pair, src);
    let inner = next_pair(&mut pair.into_inner(), "property", span)?;
    let inner_span = pair_to_span(&inner, src);

    match inner.as_rule() {
        Rule::spread_element => {
            let expr_pair = next_pair(&mut inner.into_inner(), "expression", inner_span)?;
            Ok(ObjProp::Spread {
                expr: build_expression(expr_pair, src)?,
            })
        }
        Rule::property_pair => {
            let mut inner_pairs = inner.into_inner();
            let key_pair = next_pair(&mut inner_pairs, "property key", inner_span)?;
            let key_span = pair_to_span(&key_pair, src);
            let key = build_property_key(key_pair, src)?;
            let value = build_expression(next_pair(&mut inner_pairs, "value", inner_span)?, src)?;
            Ok(ObjProp::KeyValue {
                key,
                key_span,
                value,
            })
        }
        Rule::property_method => {
            let mut inner_pairs = inner.into_inner();
            let key_pair = next_pair(&mut inner_pairs, "method name", inner_span)?;
            let key_span = pair_to_span(&key_pair, src);
            let key = build_property_key(key_pair, src)?;
            let mut params = Vec::new();
            let mut body = None;
            for part in inner_pairs {
                match part.as_rule() {
                    Rule::param_list => params = build_param_list(part, src)?,
                    Rule::block => body = Some(build_block(part, src)?),
                    _ => {}
                }
            }
            let body = body.ok_or_else(|| {
                ParseError::BuildError("Expected method body".into(), Some(inner_span))
            })?;
            let def = FunctionDef {
                name: Some(key.clone()),
                kind: FunctionKind::Expression,
                params,
                body: FunctionBody::Block {
                    body: Box::new(body),
                },
                span: inner_span,
            };
            Ok(ObjProp::KeyValue {
                key,
                key_span,
                value: Expr::Function {
                    def: Rc::new(def),
                    span: inner_span,
                },
            })
        }
        Rule::property_shorthand => Ok(ObjProp::Shorthand {
            name: inner.as_str().to_string(),
            span: inner_span,
        }),
        _ => Err(ParseError::BuildError(
            format!("Unexpected property rule: {:?}", inner.as_rule()),
            Some(inner_span),
        )),
    }
}

fn build_property_key(pair: Pair<Rule>, src: &Source) -> ParseResult<String> {
    let span = pair_to_span(&pair, src);
    let inner = next_pair(&mut pair.into_inner(), "property key", span)?;
    match inner.as_rule() {
        Rule::string => build_string_value(inner, src),
        Rule::number => Ok(crate::executor::builtins::number_to_string(parse_number(
            inner.as_str(),
            span,
        )?)),
        _ => Ok(inner.as_str().to_string()),
    }
}

fn build_array_literal(pair: Pair<Rule>, src: &Source) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, src);
    let mut elements = Vec::new();

    for item in pair.into_inner() {
        let item_span = pair_to_span(&item, src);
        let inner = next_pair(&mut item.into_inner(), "array element", item_span)?;
        if inner.as_rule() == Rule::spread_element {
            let expr_pair = next_pair(&mut inner.into_inner(), "expression", item_span)?;
            elements.push(ListItem::Spread {
                expr: build_expression(expr_pair, src)?,
            });
        } else {
            elements.push(ListItem::Item {
                expr: build_expression(inner, src)?,
            });
        }
    }

    Ok(Expr::LitList { elements, span })
}

/* ===================== JSX Builders ===================== */

fn build_jsx_element(pair: Pair<Rule>, src: &Source) -> ParseResult<JsxElement> {
    let span = pair_to_span(&pair, src);
    let form = next_pair(&mut pair.into_inner(), "JSX element", span)?;
    let form_rule = form.as_rule();

    let mut name = JsxName::Fragment;
    let mut attrs = Vec::new();
    let mut children = Vec::new();
    let mut closing: Option<(String, Span)> = None;
    let mut seen_name = false;

    for part in form.into_inner() {
        let part_span = pair_to_span(&part, src);
        match part.as_rule() {
            Rule::jsx_name if !seen_name => {
                name = JsxName::Name {
                    name: part.as_str().to_string(),
                };
                seen_name = true;
            }
            Rule::jsx_name => closing = Some((part.as_str().to_string(), part_span)),
            Rule::jsx_attribute => attrs.push(build_jsx_attribute(part, src)?),
            Rule::jsx_body => {
                for child in part.into_inner() {
                    children.push(build_jsx_child(child, src)?);
                }
            }
            _ => {}
        }
    }

    if let (JsxName::Name { name: open }, Some((close, close_span))) = (&name, &closing) {
        if open != close {
            return Err(ParseError::BuildError(
                format!("Expected corresponding JSX closing tag for <{}>", open),
                Some(*close_span),
            ));
        }
    }

    Ok(JsxElement {
        name,
        attrs,
        children,
        self_closing: form_rule == Rule::jsx_self_closing,
        span,
    })
}

fn build_jsx_attribute(pair: Pair<Rule>, src: &Source) -> ParseResult<JsxAttr> {
    let span = pair_to_span(&pair, src);
    let inner = next_pair(&mut pair.into_inner(), "JSX attribute", span)?;

    match inner.as_rule() {
        Rule::jsx_spread_attr => {
            let expr_pair = next_pair(&mut inner.into_inner(), "expression", span)?;
            Ok(JsxAttr::Spread {
                expr: build_expression(expr_pair, src)?,
            })
        }
        _ => {
            let mut parts = inner.into_inner();
            let name = next_pair(&mut parts, "attribute name", span)?
                .as_str()
                .to_string();
            let value = match parts.next() {
                None => None,
                Some(value_pair) => {
                    let value_inner = next_pair(&mut value_pair.into_inner(), "value", span)?;
                    let value_span = pair_to_span(&value_inner, src);
                    match value_inner.as_rule() {
                        Rule::jsx_string => {
                            let text = value_inner
                                .into_inner()
                                .next()
                                .map(|p| p.as_str().to_string())
                                .unwrap_or_default();
                            Some(JsxAttrValue::Str { v: text })
                        }
                        Rule::jsx_expr_container => match value_inner.into_inner().next() {
                            Some(expr_pair) => Some(JsxAttrValue::Expr {
                                expr: build_expression(expr_pair, src)?,
                            }),
                            None => {
                                return Err(ParseError::BuildError(
                                    "JSX attributes must only be assigned a non-empty expression"
                                        .to_string(),
                                    Some(value_span),
                                ))
                            }
                        },
                        _ => Some(JsxAttrValue::Expr {
                            expr: Expr::Jsx {
                                element: Box::new(build_jsx_element(value_inner, src)?),
                                span: value_span,
                            },
                        }),
                    }
                }
            };
            Ok(JsxAttr::Attr { name, value, span })
        }
    }
}

fn build_jsx_child(pair: Pair<Rule>, src: &Source) -> ParseResult<JsxChild> {
    let span = pair_to_span(&pair, src);
    let inner = next_pair(&mut pair.into_inner(), "JSX child", span)?;
    let inner_span = pair_to_span(&inner, src);

    match inner.as_rule() {
        Rule::jsx_text => Ok(JsxChild::Text {
            raw: inner.as_str().to_string(),
            span: inner_span,
        }),
        Rule::jsx_expr_container => {
            let expr = match inner.into_inner().next() {
                Some(expr_pair) => Some(build_expression(expr_pair, src)?),
                None => None,
            };
            Ok(JsxChild::Expr {
                expr,
                span: inner_span,
            })
        }
        _ => Ok(JsxChild::Element {
            element: build_jsx_element(inner, src)?,
        }),
    }
}

/* ===================== Literal Helpers ===================== */

fn parse_number(text: &str, span: Span) -> ParseResult<f64> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map(|n| n as f64).ok()
    } else {
        text.parse::<f64>().ok()
    };
    parsed.ok_or_else(|| {
        ParseError::BuildError(format!("Failed to parse number '{}'", text), Some(span))
    })
}

fn build_string_value(pair: Pair<Rule>, src: &Source) -> ParseResult<String> {
    let span = pair_to_span(&pair, src);
    match pair.into_inner().next() {
        Some(content) => unescape(content.as_str(), span),
        None => Ok(String::new()),
    }
}

/// Decode backslash escapes in string and template literal text
fn unescape(raw: &str, span: Span) -> ParseResult<String> {
    let invalid = || ParseError::BuildError("Invalid escape sequence".to_string(), Some(span));
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(invalid());
        };
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                let code = u32::from_str_radix(&hex, 16).map_err(|_| invalid())?;
                out.push(char::from_u32(code).ok_or_else(invalid)?);
            }
            'u' => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    let digits: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    digits
                } else {
                    chars.by_ref().take(4).collect()
                };
                let code = u32::from_str_radix(&hex, 16).map_err(|_| invalid())?;
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
