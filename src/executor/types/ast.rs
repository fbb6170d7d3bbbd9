//! Abstract Syntax Tree node types

use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Source location span for error reporting and source maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Start line (0-indexed)
    pub start_line: usize,
    /// Start column (0-indexed, in chars)
    pub start_col: usize,
    /// End line (0-indexed)
    pub end_line: usize,
    /// End column (0-indexed, in chars)
    pub end_col: usize,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a span that covers both self and other
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            start_line: if self.start <= other.start {
                self.start_line
            } else {
                other.start_line
            },
            start_col: if self.start <= other.start {
                self.start_col
            } else {
                other.start_col
            },
            end_line: if self.end >= other.end {
                self.end_line
            } else {
                other.end_line
            },
            end_col: if self.end >= other.end {
                self.end_col
            } else {
                other.end_col
            },
        }
    }

    /// Synthesized nodes carry the default span and have no source position
    pub fn is_synthetic(&self) -> bool {
        *self == Span::default()
    }
}

/// A parsed module: the top-level statement list of one source text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Let,
    Const,
    Var,
}

impl VarKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            VarKind::Let => "let",
            VarKind::Const => "const",
            VarKind::Var => "var",
        }
    }
}

/// For loop kind (in vs of)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForLoopKind {
    /// for (const k in obj) - iterates over keys
    In,
    /// for (const v of arr) - iterates over values
    Of,
}

/// One field of an object destructuring pattern: `{ key }` or `{ key: local }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructureField {
    pub key: String,
    pub local: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Target for variable declaration (simple identifier or destructure pattern)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum DeclareTarget {
    Simple {
        name: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Destructure {
        fields: Vec<DestructureField>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl DeclareTarget {
    /// Names bound by this target, in source order
    pub fn names(&self) -> Vec<&str> {
        match self {
            DeclareTarget::Simple { name, .. } => vec![name.as_str()],
            DeclareTarget::Destructure { fields, .. } => {
                fields.iter().map(|f| f.local.as_str()).collect()
            }
        }
    }

    pub fn span(&self) -> Span {
        match self {
            DeclareTarget::Simple { span, .. } => *span,
            DeclareTarget::Destructure { span, .. } => *span,
        }
    }
}

/// A single `target = init` entry of a declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declarator {
    pub target: DeclareTarget,
    pub init: Option<Expr>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Member access segment for assignment paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum MemberAccess {
    Prop {
        property: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Index {
        expr: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

/// Function parameter with optional default value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub target: DeclareTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
}

/// How a function was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    /// `function name() {}` as a statement
    Declaration,
    /// `function () {}` in expression position
    Expression,
    /// `() => ...`
    Arrow,
}

/// Function body: a block, or a single expression for concise arrows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum FunctionBody {
    Block { body: Box<Stmt> },
    Expr { expr: Box<Expr> },
}

/// Function definition shared by declarations, expressions and arrows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub kind: FunctionKind,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Catch clause of a try statement; the binding is optional (`catch {}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub var: Option<String>,
    pub body: Box<Stmt>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// One binding introduced by an import declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ImportSpecifier {
    /// `import local from "x"`
    Default {
        local: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `import * as local from "x"`
    Namespace {
        local: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `import { imported as local } from "x"`
    Named {
        imported: String,
        local: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl ImportSpecifier {
    pub fn local(&self) -> &str {
        match self {
            ImportSpecifier::Default { local, .. } => local,
            ImportSpecifier::Namespace { local, .. } => local,
            ImportSpecifier::Named { local, .. } => local,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ImportSpecifier::Default { span, .. } => *span,
            ImportSpecifier::Namespace { span, .. } => *span,
            ImportSpecifier::Named { span, .. } => *span,
        }
    }
}

/// `export { local as exported }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Statement AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Stmt {
    Block {
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Declare {
        var_kind: VarKind,
        decls: Vec<Declarator>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Assign {
        var: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        var_span: Span,
        path: Vec<MemberAccess>,
        value: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Function {
        def: Rc<FunctionDef>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    If {
        test: Expr,
        then_s: Box<Stmt>,
        else_s: Option<Box<Stmt>>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// C-style `for (init; test; update) body`
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ForLoop {
        kind: ForLoopKind,
        var_kind: VarKind,
        binding: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        binding_span: Span,
        iterable: Expr,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Return {
        value: Option<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Throw {
        value: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Try {
        body: Box<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Box<Stmt>>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Expr {
        expr: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Break {
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Continue {
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Import {
        specifiers: Vec<ImportSpecifier>,
        source: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `export default <expr>`
    ExportDefault {
        value: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `export <declaration>` (also `export default function name() {}`)
    ExportDecl {
        decl: Box<Stmt>,
        default: bool,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ExportNamed {
        specifiers: Vec<ExportSpecifier>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl Stmt {
    /// Get the span of this statement
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block { span, .. } => *span,
            Stmt::Declare { span, .. } => *span,
            Stmt::Assign { span, .. } => *span,
            Stmt::Function { span, .. } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::While { span, .. } => *span,
            Stmt::For { span, .. } => *span,
            Stmt::ForLoop { span, .. } => *span,
            Stmt::Return { span, .. } => *span,
            Stmt::Throw { span, .. } => *span,
            Stmt::Try { span, .. } => *span,
            Stmt::Expr { span, .. } => *span,
            Stmt::Break { span } => *span,
            Stmt::Continue { span } => *span,
            Stmt::Import { span, .. } => *span,
            Stmt::ExportDefault { span, .. } => *span,
            Stmt::ExportDecl { span, .. } => *span,
            Stmt::ExportNamed { span, .. } => *span,
        }
    }

    /// True for import/export declarations
    pub fn is_module_item(&self) -> bool {
        matches!(
            self,
            Stmt::Import { .. }
                | Stmt::ExportDefault { .. }
                | Stmt::ExportDecl { .. }
                | Stmt::ExportNamed { .. }
        )
    }
}

/// Short-circuit operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    And,     // &&
    Or,      // ||
    Nullish, // ??
}

/// Eager binary operators, dispatched to builtins at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ArithOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
            ArithOp::Eq => "==",
            ArithOp::Ne => "!=",
            ArithOp::StrictEq => "===",
            ArithOp::StrictNe => "!==",
            ArithOp::Lt => "<",
            ArithOp::Lte => "<=",
            ArithOp::Gt => ">",
            ArithOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

/// Array literal element
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ListItem {
    Item { expr: Expr },
    Spread { expr: Expr },
}

/// Object literal property
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ObjProp {
    KeyValue {
        key: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        key_span: Span,
        value: Expr,
    },
    /// `{ name }`
    Shorthand {
        name: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Spread { expr: Expr },
}

/// JSX element name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum JsxName {
    /// `<div>` or `<Foo>` or `<Foo.Bar>`
    Name { name: String },
    /// `<>...</>`
    Fragment,
}

/// JSX attribute value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum JsxAttrValue {
    Str { v: String },
    Expr { expr: Expr },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum JsxAttr {
    Attr {
        name: String,
        value: Option<JsxAttrValue>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Spread { expr: Expr },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum JsxChild {
    /// Raw text as written between tags
    Text {
        raw: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `{expr}`; `None` for an empty container such as `{/* note */}`
    Expr {
        expr: Option<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Element { element: JsxElement },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsxElement {
    pub name: JsxName,
    pub attrs: Vec<JsxAttr>,
    pub children: Vec<JsxChild>,
    pub self_closing: bool,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Expression AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Expr {
    LitBool {
        v: bool,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    LitNum {
        v: f64,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    LitStr {
        v: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    LitNull {
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    LitList {
        elements: Vec<ListItem>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    LitObj {
        properties: Vec<ObjProp>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// Template literal: `quasis.len() == exprs.len() + 1`
    Template {
        quasis: Vec<String>,
        exprs: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Ident {
        name: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Member {
        object: Box<Expr>,
        property: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        property_span: Span,
        optional: bool,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Ternary {
        condition: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Function {
        def: Rc<FunctionDef>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `new Callee(args)`
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Jsx {
        element: Box<JsxElement>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl Expr {
    /// Get the span of this expression
    pub fn span(&self) -> Span {
        match self {
            Expr::LitBool { span, .. } => *span,
            Expr::LitNum { span, .. } => *span,
            Expr::LitStr { span, .. } => *span,
            Expr::LitNull { span } => *span,
            Expr::LitList { span, .. } => *span,
            Expr::LitObj { span, .. } => *span,
            Expr::Template { span, .. } => *span,
            Expr::Ident { span, .. } => *span,
            Expr::Member { span, .. } => *span,
            Expr::Index { span, .. } => *span,
            Expr::Call { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Arith { span, .. } => *span,
            Expr::BinaryOp { span, .. } => *span,
            Expr::Ternary { span, .. } => *span,
            Expr::Function { span, .. } => *span,
            Expr::New { span, .. } => *span,
            Expr::Jsx { span, .. } => *span,
        }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Expr {
        Expr::Ident {
            name: name.into(),
            span,
        }
    }

    pub fn string(v: impl Into<String>, span: Span) -> Expr {
        Expr::LitStr { v: v.into(), span }
    }

    pub fn member(object: Expr, property: impl Into<String>, span: Span) -> Expr {
        Expr::Member {
            object: Box::new(object),
            property: property.into(),
            property_span: span,
            optional: false,
            span,
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>, span: Span) -> Expr {
        Expr::Call {
            callee: Box::new(callee),
            args,
            optional: false,
            span,
        }
    }
}

/// Helper function for serde to skip serializing default spans
fn is_default_span(span: &Span) -> bool {
    *span == Span::default()
}
