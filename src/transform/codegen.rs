//! Target code generation
//!
//! Prints a module back to source text. Lines are retained: every statement
//! that came from the source starts on the line it started on there, so line
//! numbers in runtime errors stay meaningful even without the source map.
//! Statements synthesized by passes carry the span of the statement they
//! replace and land on the same line.

use crate::executor::builtins::number_to_string;
use crate::executor::types::ast::{
    ArithOp, BinaryOp, DeclareTarget, Declarator, ExportSpecifier, Expr, ForLoopKind,
    FunctionBody, FunctionDef, FunctionKind, ImportSpecifier, JsxAttr, JsxAttrValue, JsxChild, JsxElement,
    JsxName, ListItem, MemberAccess, Module, ObjProp, Param, Span, Stmt, UnaryOp, VarKind,
};
use crate::parser::is_reserved_word;

use super::source_map::Mapping;

/// Printed program plus one mapping per source statement
#[derive(Debug, Clone)]
pub struct Generated {
    pub code: String,
    pub mappings: Vec<Mapping>,
}

/// Print a module with retained lines
pub fn generate(module: &Module) -> Generated {
    let mut printer = Printer::default();
    for stmt in &module.body {
        printer.stmt(stmt);
    }
    Generated {
        code: printer.out,
        mappings: printer.mappings,
    }
}

/// Print a single expression (diagnostics and tests)
pub fn expr_to_string(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr, PREC_ARROW);
    printer.out
}

/* ===================== Precedence ===================== */

const PREC_ARROW: u8 = 1;
const PREC_TERNARY: u8 = 2;
const PREC_NULLISH: u8 = 3;
const PREC_OR: u8 = 4;
const PREC_AND: u8 = 5;
const PREC_EQUALITY: u8 = 6;
const PREC_COMPARISON: u8 = 7;
const PREC_ADDITIVE: u8 = 8;
const PREC_MULTIPLICATIVE: u8 = 9;
const PREC_UNARY: u8 = 10;
const PREC_POSTFIX: u8 = 11;
const PREC_PRIMARY: u8 = 12;

fn arith_precedence(op: ArithOp) -> u8 {
    match op {
        ArithOp::Eq | ArithOp::Ne | ArithOp::StrictEq | ArithOp::StrictNe => PREC_EQUALITY,
        ArithOp::Lt | ArithOp::Lte | ArithOp::Gt | ArithOp::Gte => PREC_COMPARISON,
        ArithOp::Add | ArithOp::Sub => PREC_ADDITIVE,
        ArithOp::Mul | ArithOp::Div | ArithOp::Mod => PREC_MULTIPLICATIVE,
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Function { def, .. } if def.kind == FunctionKind::Arrow => PREC_ARROW,
        Expr::Ternary { .. } => PREC_TERNARY,
        Expr::BinaryOp { op, .. } => match op {
            BinaryOp::Nullish => PREC_NULLISH,
            BinaryOp::Or => PREC_OR,
            BinaryOp::And => PREC_AND,
        },
        Expr::Arith { op, .. } => arith_precedence(*op),
        Expr::Unary { .. } => PREC_UNARY,
        Expr::LitNum { v, .. } if v.is_sign_negative() && *v != 0.0 => PREC_UNARY,
        Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => PREC_POSTFIX,
        _ => PREC_PRIMARY,
    }
}

/// An expression statement must not start with `{` or `function`
fn starts_ambiguously(expr: &Expr) -> bool {
    match expr {
        Expr::LitObj { .. } => true,
        Expr::Function { def, .. } => def.kind != FunctionKind::Arrow,
        Expr::Member { object, .. } | Expr::Index { object, .. } => starts_ambiguously(object),
        Expr::Call { callee, .. } => starts_ambiguously(callee),
        Expr::Arith { left, .. } | Expr::BinaryOp { left, .. } => starts_ambiguously(left),
        Expr::Ternary { condition, .. } => starts_ambiguously(condition),
        _ => false,
    }
}

/// Can `name` be written after a `.`?
fn is_property_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Can `name` be written as a bare binding?
pub fn is_identifier(name: &str) -> bool {
    is_property_name(name) && !is_reserved_word(name)
}

pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => out.push_str(&format!("\\u{:04x}", ch as u32)),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn escape_template(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn property_key(key: &str) -> String {
    if is_property_name(key) {
        return key.to_string();
    }
    if let Ok(n) = key.parse::<f64>() {
        if n >= 0.0 && number_to_string(n) == key {
            return key.to_string();
        }
    }
    quote_string(key)
}

/* ===================== Printer ===================== */

#[derive(Default)]
struct Printer {
    out: String,
    line: usize,
    col: usize,
    indent: usize,
    mappings: Vec<Mapping>,
}

impl Printer {
    fn write(&mut self, s: &str) {
        for ch in s.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        let indent = " ".repeat(self.indent * 2);
        self.write("\n");
        self.write(&indent);
    }

    fn space_if_needed(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with(['\n', ' ', '(']) {
            self.write(" ");
        }
    }

    /// Move to the statement's source line, or keep going on this one
    fn begin_stmt(&mut self, span: &Span) {
        if !span.is_synthetic() && span.start_line > self.line {
            while self.line < span.start_line {
                self.newline();
            }
        } else {
            self.space_if_needed();
        }
        if !span.is_synthetic() {
            self.mappings.push(Mapping {
                generated_line: self.line,
                generated_col: self.col,
                source_line: span.start_line,
                source_col: span.start_col,
            });
        }
    }

    /* ---------- Statements ---------- */

    fn stmt(&mut self, stmt: &Stmt) {
        self.begin_stmt(&stmt.span());
        match stmt {
            Stmt::Block { body, .. } => self.block(body),

            Stmt::Declare { .. } | Stmt::Assign { .. } => {
                self.clause(stmt);
                self.write(";");
            }

            Stmt::Function { def, .. } => self.function(def),

            Stmt::If {
                test,
                then_s,
                else_s,
                ..
            } => {
                self.write("if (");
                self.expr(test, PREC_ARROW);
                self.write(")");
                self.stmt(then_s);
                if let Some(else_s) = else_s {
                    self.write(" else");
                    self.stmt(else_s);
                }
            }

            Stmt::While { test, body, .. } => {
                self.write("while (");
                self.expr(test, PREC_ARROW);
                self.write(")");
                self.stmt(body);
            }

            Stmt::For {
                init,
                test,
                update,
                body,
                ..
            } => {
                self.write("for (");
                if let Some(init) = init {
                    self.clause(init);
                }
                self.write(";");
                if let Some(test) = test {
                    self.write(" ");
                    self.expr(test, PREC_ARROW);
                }
                self.write(";");
                if let Some(update) = update {
                    self.write(" ");
                    self.clause(update);
                }
                self.write(")");
                self.stmt(body);
            }

            Stmt::ForLoop {
                kind,
                var_kind,
                binding,
                iterable,
                body,
                ..
            } => {
                let word = match kind {
                    ForLoopKind::In => "in",
                    ForLoopKind::Of => "of",
                };
                self.write(&format!("for ({} {} {} ", var_kind.keyword(), binding, word));
                self.expr(iterable, PREC_ARROW);
                self.write(")");
                self.stmt(body);
            }

            Stmt::Return { value, .. } => {
                self.write("return");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(value, PREC_ARROW);
                }
                self.write(";");
            }

            Stmt::Throw { value, .. } => {
                self.write("throw ");
                self.expr(value, PREC_ARROW);
                self.write(";");
            }

            Stmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                self.write("try");
                self.stmt(body);
                if let Some(clause) = catch {
                    self.write(" catch");
                    if let Some(var) = &clause.var {
                        self.write(&format!(" ({})", var));
                    }
                    self.stmt(&clause.body);
                }
                if let Some(finally) = finally {
                    self.write(" finally");
                    self.stmt(finally);
                }
            }

            Stmt::Expr { expr, .. } => {
                if starts_ambiguously(expr) {
                    self.write("(");
                    self.expr(expr, PREC_ARROW);
                    self.write(")");
                } else {
                    self.expr(expr, PREC_ARROW);
                }
                self.write(";");
            }

            Stmt::Break { .. } => self.write("break;"),

            Stmt::Continue { .. } => self.write("continue;"),

            Stmt::Import {
                specifiers, source, ..
            } => self.import(specifiers, source),

            Stmt::ExportDefault { value, .. } => {
                self.write("export default ");
                self.expr(value, PREC_ARROW);
                self.write(";");
            }

            Stmt::ExportDecl { decl, default, .. } => {
                self.write(if *default { "export default" } else { "export" });
                self.stmt(decl);
            }

            Stmt::ExportNamed { specifiers, .. } => self.export_named(specifiers),
        }
    }

    fn block(&mut self, body: &[Stmt]) {
        if body.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        self.indent += 1;
        for stmt in body {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.space_if_needed();
        self.write("}");
    }

    /// Declaration or assignment without the trailing semicolon
    fn clause(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare {
                var_kind, decls, ..
            } => self.declaration(*var_kind, decls),
            Stmt::Assign {
                var, path, value, ..
            } => {
                self.write(var);
                for segment in path {
                    match segment {
                        MemberAccess::Prop { property, .. } if is_property_name(property) => {
                            self.write(".");
                            self.write(property);
                        }
                        MemberAccess::Prop { property, .. } => {
                            self.write("[");
                            self.write(&quote_string(property));
                            self.write("]");
                        }
                        MemberAccess::Index { expr, .. } => {
                            self.write("[");
                            self.expr(expr, PREC_ARROW);
                            self.write("]");
                        }
                    }
                }
                self.write(" = ");
                self.expr(value, PREC_ARROW);
            }
            // Only declarations and assignments appear in clause position
            other => self.stmt(other),
        }
    }

    fn declaration(&mut self, var_kind: VarKind, decls: &[Declarator]) {
        self.write(var_kind.keyword());
        for (idx, decl) in decls.iter().enumerate() {
            self.write(if idx == 0 { " " } else { ", " });
            self.declare_target(&decl.target);
            if let Some(init) = &decl.init {
                self.write(" = ");
                self.expr(init, PREC_ARROW);
            }
        }
    }

    fn declare_target(&mut self, target: &DeclareTarget) {
        match target {
            DeclareTarget::Simple { name, .. } => self.write(name),
            DeclareTarget::Destructure { fields, .. } => {
                if fields.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                for (idx, field) in fields.iter().enumerate() {
                    if idx > 0 {
                        self.write(", ");
                    }
                    self.write(&field.key);
                    if field.local != field.key {
                        self.write(": ");
                        self.write(&field.local);
                    }
                    if let Some(default) = &field.default {
                        self.write(" = ");
                        self.expr(default, PREC_ARROW);
                    }
                }
                self.write(" }");
            }
        }
    }

    fn import(&mut self, specifiers: &[ImportSpecifier], source: &str) {
        self.write("import ");
        if specifiers.is_empty() {
            self.write(&quote_string(source));
            self.write(";");
            return;
        }

        let mut parts = Vec::new();
        let mut named = Vec::new();
        for spec in specifiers {
            match spec {
                ImportSpecifier::Default { local, .. } => parts.push(local.clone()),
                ImportSpecifier::Namespace { local, .. } => parts.push(format!("* as {}", local)),
                ImportSpecifier::Named {
                    imported, local, ..
                } if imported == local => named.push(local.clone()),
                ImportSpecifier::Named {
                    imported, local, ..
                } => named.push(format!("{} as {}", imported, local)),
            }
        }
        if !named.is_empty() {
            parts.push(format!("{{ {} }}", named.join(", ")));
        }
        self.write(&format!("{} from {};", parts.join(", "), quote_string(source)));
    }

    fn export_named(&mut self, specifiers: &[ExportSpecifier]) {
        let names: Vec<String> = specifiers
            .iter()
            .map(|s| {
                if s.local == s.exported {
                    s.local.clone()
                } else {
                    format!("{} as {}", s.local, s.exported)
                }
            })
            .collect();
        if names.is_empty() {
            self.write("export {};");
        } else {
            self.write(&format!("export {{ {} }};", names.join(", ")));
        }
    }

    /* ---------- Functions ---------- */

    fn params(&mut self, params: &[Param]) {
        self.write("(");
        for (idx, param) in params.iter().enumerate() {
            if idx > 0 {
                self.write(", ");
            }
            self.declare_target(&param.target);
            if let Some(default) = &param.default {
                self.write(" = ");
                self.expr(default, PREC_ARROW);
            }
        }
        self.write(")");
    }

    fn function(&mut self, def: &FunctionDef) {
        if def.kind == FunctionKind::Arrow {
            self.params(&def.params);
            self.write(" => ");
            match &def.body {
                FunctionBody::Block { body } => self.function_body(body),
                FunctionBody::Expr { expr } => {
                    if matches!(expr.as_ref(), Expr::LitObj { .. }) {
                        self.write("(");
                        self.expr(expr, PREC_ARROW);
                        self.write(")");
                    } else {
                        self.expr(expr, PREC_ARROW);
                    }
                }
            }
            return;
        }

        self.write("function");
        if let Some(name) = &def.name {
            self.write(" ");
            self.write(name);
        }
        self.params(&def.params);
        self.write(" ");
        match &def.body {
            FunctionBody::Block { body } => self.function_body(body),
            FunctionBody::Expr { expr } => {
                self.write("{ return ");
                self.expr(expr, PREC_ARROW);
                self.write("; }");
            }
        }
    }

    fn function_body(&mut self, body: &Stmt) {
        match body {
            Stmt::Block { body, .. } => self.block(body),
            other => {
                self.write("{");
                self.stmt(other);
                self.write(" }");
            }
        }
    }

    /* ---------- Expressions ---------- */

    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        if precedence(expr) < min_prec {
            self.write("(");
            self.expr_inner(expr);
            self.write(")");
        } else {
            self.expr_inner(expr);
        }
    }

    fn args(&mut self, args: &[Expr]) {
        for (idx, arg) in args.iter().enumerate() {
            if idx > 0 {
                self.write(", ");
            }
            self.expr(arg, PREC_ARROW);
        }
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::LitBool { v, .. } => self.write(if *v { "true" } else { "false" }),

            Expr::LitNum { v, .. } => self.write(&number_to_string(*v)),

            Expr::LitStr { v, .. } => self.write(&quote_string(v)),

            Expr::LitNull { .. } => self.write("null"),

            Expr::LitList { elements, .. } => {
                self.write("[");
                for (idx, element) in elements.iter().enumerate() {
                    if idx > 0 {
                        self.write(", ");
                    }
                    match element {
                        ListItem::Item { expr } => self.expr(expr, PREC_ARROW),
                        ListItem::Spread { expr } => {
                            self.write("...");
                            self.expr(expr, PREC_ARROW);
                        }
                    }
                }
                self.write("]");
            }

            Expr::LitObj { properties, .. } => {
                if properties.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                for (idx, prop) in properties.iter().enumerate() {
                    if idx > 0 {
                        self.write(", ");
                    }
                    match prop {
                        ObjProp::KeyValue { key, value, .. } => {
                            self.write(&property_key(key));
                            self.write(": ");
                            self.expr(value, PREC_ARROW);
                        }
                        ObjProp::Shorthand { name, .. } => self.write(name),
                        ObjProp::Spread { expr } => {
                            self.write("...");
                            self.expr(expr, PREC_ARROW);
                        }
                    }
                }
                self.write(" }");
            }

            Expr::Template { quasis, exprs, .. } => {
                self.write("`");
                for (idx, quasi) in quasis.iter().enumerate() {
                    self.write(&escape_template(quasi));
                    if let Some(expr) = exprs.get(idx) {
                        self.write("${");
                        self.expr(expr, PREC_ARROW);
                        self.write("}");
                    }
                }
                self.write("`");
            }

            Expr::Ident { name, .. } => self.write(name),

            Expr::Member {
                object,
                property,
                optional,
                ..
            } => {
                self.expr(object, PREC_POSTFIX);
                if is_property_name(property) {
                    self.write(if *optional { "?." } else { "." });
                    self.write(property);
                } else {
                    self.write(if *optional { "?.[" } else { "[" });
                    self.write(&quote_string(property));
                    self.write("]");
                }
            }

            Expr::Index {
                object,
                index,
                optional,
                ..
            } => {
                self.expr(object, PREC_POSTFIX);
                self.write(if *optional { "?.[" } else { "[" });
                self.expr(index, PREC_ARROW);
                self.write("]");
            }

            Expr::Call {
                callee,
                args,
                optional,
                ..
            } => {
                self.expr(callee, PREC_POSTFIX);
                self.write(if *optional { "?.(" } else { "(" });
                self.args(args);
                self.write(")");
            }

            Expr::New { callee, args, .. } => {
                self.write("new ");
                self.expr(callee, PREC_POSTFIX);
                self.write("(");
                self.args(args);
                self.write(")");
            }

            Expr::Unary { op, operand, .. } => {
                self.write(match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::TypeOf => "typeof ",
                });
                // Keep `- -x` from reading as a decrement
                let signed_operand = match operand.as_ref() {
                    Expr::Unary {
                        op: UnaryOp::Neg | UnaryOp::Plus,
                        ..
                    } => true,
                    Expr::LitNum { v, .. } => v.is_sign_negative() && *v != 0.0,
                    _ => false,
                };
                if signed_operand && matches!(op, UnaryOp::Neg | UnaryOp::Plus) {
                    self.write("(");
                    self.expr(operand, PREC_ARROW);
                    self.write(")");
                } else {
                    self.expr(operand, PREC_UNARY);
                }
            }

            Expr::Arith {
                op, left, right, ..
            } => {
                let prec = arith_precedence(*op);
                self.expr(left, prec);
                self.write(&format!(" {} ", op.symbol()));
                self.expr(right, prec + 1);
            }

            Expr::BinaryOp {
                op, left, right, ..
            } => {
                let prec = precedence(expr);
                let symbol = match op {
                    BinaryOp::And => "&&",
                    BinaryOp::Or => "||",
                    BinaryOp::Nullish => "??",
                };
                self.expr(left, prec);
                self.write(&format!(" {} ", symbol));
                self.expr(right, prec + 1);
            }

            Expr::Ternary {
                condition,
                consequent,
                alternate,
                ..
            } => {
                self.expr(condition, PREC_TERNARY + 1);
                self.write(" ? ");
                self.expr(consequent, PREC_ARROW);
                self.write(" : ");
                self.expr(alternate, PREC_ARROW);
            }

            Expr::Function { def, .. } => self.function(def),

            Expr::Jsx { element, .. } => self.jsx(element),
        }
    }

    /* ---------- JSX ---------- */

    fn jsx(&mut self, element: &JsxElement) {
        let name = match &element.name {
            JsxName::Name { name } => name.as_str(),
            JsxName::Fragment => "",
        };

        self.write("<");
        self.write(name);
        for attr in &element.attrs {
            self.write(" ");
            match attr {
                JsxAttr::Attr { name, value, .. } => {
                    self.write(name);
                    match value {
                        None => {}
                        Some(JsxAttrValue::Str { v }) => {
                            let quote = if v.contains('"') { '\'' } else { '"' };
                            self.write(&format!("={}{}{}", quote, v, quote));
                        }
                        Some(JsxAttrValue::Expr { expr }) => {
                            self.write("={");
                            self.expr(expr, PREC_ARROW);
                            self.write("}");
                        }
                    }
                }
                JsxAttr::Spread { expr } => {
                    self.write("{...");
                    self.expr(expr, PREC_ARROW);
                    self.write("}");
                }
            }
        }

        if element.self_closing {
            self.write(" />");
            return;
        }

        self.write(">");
        for child in &element.children {
            match child {
                JsxChild::Text { raw, .. } => self.write(raw),
                JsxChild::Expr { expr, .. } => {
                    self.write("{");
                    if let Some(expr) = expr {
                        self.expr(expr, PREC_ARROW);
                    }
                    self.write("}");
                }
                JsxChild::Element { element } => self.jsx(element),
            }
        }
        self.write("</");
        self.write(name);
        self.write(">");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_expression, parse_module};

    fn roundtrip(source: &str) -> String {
        let module = parse_module(source).unwrap();
        generate(&module).code
    }

    #[test]
    fn test_lines_are_retained() {
        let code = roundtrip("let a = 1\n\n\nlet b = 2");
        assert_eq!(code, "let a = 1;\n\n\nlet b = 2;");
    }

    #[test]
    fn test_nested_statements_keep_their_lines() {
        let source = "function f(x) {\n  if (x) {\n    return 1\n  }\n  return 2\n}";
        let code = roundtrip(source);
        assert_eq!(code.lines().count(), 5);
        assert!(code.lines().nth(2).unwrap().contains("return 1;"));
        assert!(code.lines().nth(4).unwrap().contains("return 2;"));
    }

    #[test]
    fn test_parenthesizes_by_precedence() {
        let expr = parse_expression("(a + b) * c").unwrap();
        assert_eq!(expr_to_string(&expr), "(a + b) * c");

        let expr = parse_expression("a - (b - c)").unwrap();
        assert_eq!(expr_to_string(&expr), "a - (b - c)");

        let expr = parse_expression("(a ?? b) || c").unwrap();
        assert_eq!(expr_to_string(&expr), "(a ?? b) || c");
    }

    #[test]
    fn test_object_literal_statement_is_wrapped() {
        let code = roundtrip("({ a: 1 }).a");
        assert_eq!(code, "({ a: 1 }.a);");
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(quote_string("a\"b\n"), "\"a\\\"b\\n\"");
    }

    #[test]
    fn test_mappings_point_at_statement_starts() {
        let module = parse_module("let a = 1\n  let b = 2").unwrap();
        let generated = generate(&module);
        assert_eq!(generated.mappings.len(), 2);
        assert_eq!(generated.mappings[1].generated_line, 1);
        assert_eq!(generated.mappings[1].source_col, 2);
    }

    #[test]
    fn test_printed_code_reparses_identically() {
        let source = r#"
            const { a, b: c = 2 } = obj
            const f = (x, y = 1) => x?.y ?? `t${y}`
            for (let i = 0; i < 3; i = i + 1) { total = total + i }
            try { g() } catch (e) { h(e) } finally { done = true }
        "#;
        let once = roundtrip(source);
        let twice = roundtrip(&once);
        assert_eq!(once, twice);
    }
}
