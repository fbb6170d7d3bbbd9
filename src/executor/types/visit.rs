//! AST traversal
//!
//! `Visitor` walks the tree by reference, `VisitorMut` by mutable reference.
//! Implementors override the hooks they care about and call the matching
//! `walk_*` function to keep descending.

use std::rc::Rc;

use super::ast::{
    DeclareTarget, Expr, FunctionBody, FunctionDef, JsxAttr, JsxAttrValue, JsxChild, JsxElement,
    ListItem, MemberAccess, Module, ObjProp, Stmt,
};

/* ===================== Immutable ===================== */

pub trait Visitor {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, def: &FunctionDef) {
        walk_function(self, def);
    }

    fn visit_jsx_element(&mut self, element: &JsxElement) {
        walk_jsx_element(self, element);
    }
}

pub fn walk_module<V: Visitor + ?Sized>(v: &mut V, module: &Module) {
    for stmt in &module.body {
        v.visit_stmt(stmt);
    }
}

pub fn walk_declare_target<V: Visitor + ?Sized>(v: &mut V, target: &DeclareTarget) {
    if let DeclareTarget::Destructure { fields, .. } = target {
        for field in fields {
            if let Some(default) = &field.default {
                v.visit_expr(default);
            }
        }
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Block { body, .. } => {
            for s in body {
                v.visit_stmt(s);
            }
        }
        Stmt::Declare { decls, .. } => {
            for decl in decls {
                walk_declare_target(v, &decl.target);
                if let Some(init) = &decl.init {
                    v.visit_expr(init);
                }
            }
        }
        Stmt::Assign { path, value, .. } => {
            for segment in path {
                if let MemberAccess::Index { expr, .. } = segment {
                    v.visit_expr(expr);
                }
            }
            v.visit_expr(value);
        }
        Stmt::Function { def, .. } => v.visit_function(def),
        Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            v.visit_expr(test);
            v.visit_stmt(then_s);
            if let Some(else_s) = else_s {
                v.visit_stmt(else_s);
            }
        }
        Stmt::While { test, body, .. } => {
            v.visit_expr(test);
            v.visit_stmt(body);
        }
        Stmt::For {
            init,
            test,
            update,
            body,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(test) = test {
                v.visit_expr(test);
            }
            if let Some(update) = update {
                v.visit_stmt(update);
            }
            v.visit_stmt(body);
        }
        Stmt::ForLoop { iterable, body, .. } => {
            v.visit_expr(iterable);
            v.visit_stmt(body);
        }
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::Throw { value, .. } => v.visit_expr(value),
        Stmt::Try {
            body,
            catch,
            finally,
            ..
        } => {
            v.visit_stmt(body);
            if let Some(catch) = catch {
                v.visit_stmt(&catch.body);
            }
            if let Some(finally) = finally {
                v.visit_stmt(finally);
            }
        }
        Stmt::Expr { expr, .. } => v.visit_expr(expr),
        Stmt::ExportDefault { value, .. } => v.visit_expr(value),
        Stmt::ExportDecl { decl, .. } => v.visit_stmt(decl),
        Stmt::Break { .. }
        | Stmt::Continue { .. }
        | Stmt::Import { .. }
        | Stmt::ExportNamed { .. } => {}
    }
}

pub fn walk_function<V: Visitor + ?Sized>(v: &mut V, def: &FunctionDef) {
    for param in &def.params {
        walk_declare_target(v, &param.target);
        if let Some(default) = &param.default {
            v.visit_expr(default);
        }
    }
    match &def.body {
        FunctionBody::Block { body } => v.visit_stmt(body),
        FunctionBody::Expr { expr } => v.visit_expr(expr),
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::LitList { elements, .. } => {
            for item in elements {
                match item {
                    ListItem::Item { expr } | ListItem::Spread { expr } => v.visit_expr(expr),
                }
            }
        }
        Expr::LitObj { properties, .. } => {
            for prop in properties {
                match prop {
                    ObjProp::KeyValue { value, .. } => v.visit_expr(value),
                    ObjProp::Spread { expr } => v.visit_expr(expr),
                    ObjProp::Shorthand { .. } => {}
                }
            }
        }
        Expr::Template { exprs, .. } => {
            for e in exprs {
                v.visit_expr(e);
            }
        }
        Expr::Member { object, .. } => v.visit_expr(object),
        Expr::Index { object, index, .. } => {
            v.visit_expr(object);
            v.visit_expr(index);
        }
        Expr::Call { callee, args, .. } | Expr::New { callee, args, .. } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Unary { operand, .. } => v.visit_expr(operand),
        Expr::Arith { left, right, .. } | Expr::BinaryOp { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        Expr::Ternary {
            condition,
            consequent,
            alternate,
            ..
        } => {
            v.visit_expr(condition);
            v.visit_expr(consequent);
            v.visit_expr(alternate);
        }
        Expr::Function { def, .. } => v.visit_function(def),
        Expr::Jsx { element, .. } => v.visit_jsx_element(element),
        Expr::LitBool { .. }
        | Expr::LitNum { .. }
        | Expr::LitStr { .. }
        | Expr::LitNull { .. }
        | Expr::Ident { .. } => {}
    }
}

pub fn walk_jsx_element<V: Visitor + ?Sized>(v: &mut V, element: &JsxElement) {
    for attr in &element.attrs {
        match attr {
            JsxAttr::Attr {
                value: Some(JsxAttrValue::Expr { expr }),
                ..
            } => v.visit_expr(expr),
            JsxAttr::Spread { expr } => v.visit_expr(expr),
            JsxAttr::Attr { .. } => {}
        }
    }
    for child in &element.children {
        match child {
            JsxChild::Expr {
                expr: Some(expr), ..
            } => v.visit_expr(expr),
            JsxChild::Element { element } => v.visit_jsx_element(element),
            JsxChild::Expr { expr: None, .. } | JsxChild::Text { .. } => {}
        }
    }
}

/* ===================== Mutable ===================== */

pub trait VisitorMut {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    fn visit_function_mut(&mut self, def: &mut FunctionDef) {
        walk_function_mut(self, def);
    }

    fn visit_jsx_element_mut(&mut self, element: &mut JsxElement) {
        walk_jsx_element_mut(self, element);
    }
}

pub fn walk_module_mut<V: VisitorMut + ?Sized>(v: &mut V, module: &mut Module) {
    for stmt in &mut module.body {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_declare_target_mut<V: VisitorMut + ?Sized>(v: &mut V, target: &mut DeclareTarget) {
    if let DeclareTarget::Destructure { fields, .. } = target {
        for field in fields {
            if let Some(default) = &mut field.default {
                v.visit_expr_mut(default);
            }
        }
    }
}

pub fn walk_stmt_mut<V: VisitorMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Block { body, .. } => {
            for s in body {
                v.visit_stmt_mut(s);
            }
        }
        Stmt::Declare { decls, .. } => {
            for decl in decls {
                walk_declare_target_mut(v, &mut decl.target);
                if let Some(init) = &mut decl.init {
                    v.visit_expr_mut(init);
                }
            }
        }
        Stmt::Assign { path, value, .. } => {
            for segment in path {
                if let MemberAccess::Index { expr, .. } = segment {
                    v.visit_expr_mut(expr);
                }
            }
            v.visit_expr_mut(value);
        }
        Stmt::Function { def, .. } => v.visit_function_mut(Rc::make_mut(def)),
        Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            v.visit_expr_mut(test);
            v.visit_stmt_mut(then_s);
            if let Some(else_s) = else_s {
                v.visit_stmt_mut(else_s);
            }
        }
        Stmt::While { test, body, .. } => {
            v.visit_expr_mut(test);
            v.visit_stmt_mut(body);
        }
        Stmt::For {
            init,
            test,
            update,
            body,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(test) = test {
                v.visit_expr_mut(test);
            }
            if let Some(update) = update {
                v.visit_stmt_mut(update);
            }
            v.visit_stmt_mut(body);
        }
        Stmt::ForLoop { iterable, body, .. } => {
            v.visit_expr_mut(iterable);
            v.visit_stmt_mut(body);
        }
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
        }
        Stmt::Throw { value, .. } => v.visit_expr_mut(value),
        Stmt::Try {
            body,
            catch,
            finally,
            ..
        } => {
            v.visit_stmt_mut(body);
            if let Some(catch) = catch {
                v.visit_stmt_mut(&mut catch.body);
            }
            if let Some(finally) = finally {
                v.visit_stmt_mut(finally);
            }
        }
        Stmt::Expr { expr, .. } => v.visit_expr_mut(expr),
        Stmt::ExportDefault { value, .. } => v.visit_expr_mut(value),
        Stmt::ExportDecl { decl, .. } => v.visit_stmt_mut(decl),
        Stmt::Break { .. }
        | Stmt::Continue { .. }
        | Stmt::Import { .. }
        | Stmt::ExportNamed { .. } => {}
    }
}

pub fn walk_function_mut<V: VisitorMut + ?Sized>(v: &mut V, def: &mut FunctionDef) {
    for param in &mut def.params {
        walk_declare_target_mut(v, &mut param.target);
        if let Some(default) = &mut param.default {
            v.visit_expr_mut(default);
        }
    }
    match &mut def.body {
        FunctionBody::Block { body } => v.visit_stmt_mut(body),
        FunctionBody::Expr { expr } => v.visit_expr_mut(expr),
    }
}

pub fn walk_expr_mut<V: VisitorMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::LitList { elements, .. } => {
            for item in elements {
                match item {
                    ListItem::Item { expr } | ListItem::Spread { expr } => v.visit_expr_mut(expr),
                }
            }
        }
        Expr::LitObj { properties, .. } => {
            for prop in properties {
                match prop {
                    ObjProp::KeyValue { value, .. } => v.visit_expr_mut(value),
                    ObjProp::Spread { expr } => v.visit_expr_mut(expr),
                    ObjProp::Shorthand { .. } => {}
                }
            }
        }
        Expr::Template { exprs, .. } => {
            for e in exprs {
                v.visit_expr_mut(e);
            }
        }
        Expr::Member { object, .. } => v.visit_expr_mut(object),
        Expr::Index { object, index, .. } => {
            v.visit_expr_mut(object);
            v.visit_expr_mut(index);
        }
        Expr::Call { callee, args, .. } | Expr::New { callee, args, .. } => {
            v.visit_expr_mut(callee);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        Expr::Unary { operand, .. } => v.visit_expr_mut(operand),
        Expr::Arith { left, right, .. } | Expr::BinaryOp { left, right, .. } => {
            v.visit_expr_mut(left);
            v.visit_expr_mut(right);
        }
        Expr::Ternary {
            condition,
            consequent,
            alternate,
            ..
        } => {
            v.visit_expr_mut(condition);
            v.visit_expr_mut(consequent);
            v.visit_expr_mut(alternate);
        }
        Expr::Function { def, .. } => v.visit_function_mut(Rc::make_mut(def)),
        Expr::Jsx { element, .. } => v.visit_jsx_element_mut(element),
        Expr::LitBool { .. }
        | Expr::LitNum { .. }
        | Expr::LitStr { .. }
        | Expr::LitNull { .. }
        | Expr::Ident { .. } => {}
    }
}

pub fn walk_jsx_element_mut<V: VisitorMut + ?Sized>(v: &mut V, element: &mut JsxElement) {
    for attr in &mut element.attrs {
        match attr {
            JsxAttr::Attr {
                value: Some(JsxAttrValue::Expr { expr }),
                ..
            } => v.visit_expr_mut(expr),
            JsxAttr::Spread { expr } => v.visit_expr_mut(expr),
            JsxAttr::Attr { .. } => {}
        }
    }
    for child in &mut element.children {
        match child {
            JsxChild::Expr {
                expr: Some(expr), ..
            } => v.visit_expr_mut(expr),
            JsxChild::Element { element } => v.visit_jsx_element_mut(element),
            JsxChild::Expr { expr: None, .. } | JsxChild::Text { .. } => {}
        }
    }
}
