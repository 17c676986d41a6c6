// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Generic depth-first traversal of the AST.
//!
//! **DDD Context:** Source Analysis
//!
//! [`walk`] visits a node, then its children, with a [`Visitor`] that
//! decides per node whether to descend and which visitor to descend with.
//! [`inspect`] is the closure form for the common case.
//!
//! Identifiers, literals, comments, comment groups and `Bad` nodes are
//! terminal: they are visited but have no children, so `enter`/`leave` are
//! never called for them.

use std::fmt::Write as _;

use crate::ast::{
    BasicLit, Comment, CommentGroup, Decl, Expr, Field, FieldList, File, Ident, Package, Spec,
    Type,
};
use crate::source_analysis::Pos;

/// A borrowed reference to any AST node.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Package(&'a Package),
    File(&'a File),
    Decl(&'a Decl),
    Spec(&'a Spec),
    FieldList(&'a FieldList),
    Field(&'a Field),
    Type(&'a Type),
    Expr(&'a Expr),
    Ident(&'a Ident),
    BasicLit(&'a BasicLit),
    CommentGroup(&'a CommentGroup),
    Comment(&'a Comment),
}

impl Node<'_> {
    #[must_use]
    pub fn begin(&self) -> Pos {
        match self {
            Self::Package(package) => package
                .files
                .values()
                .next()
                .map_or(Pos::NONE, File::begin),
            Self::File(file) => file.begin(),
            Self::Decl(decl) => decl.begin(),
            Self::Spec(spec) => spec.begin(),
            Self::FieldList(list) => list.opening,
            Self::Field(field) => field.begin(),
            Self::Type(ty) => ty.begin(),
            Self::Expr(expr) => expr.begin(),
            Self::Ident(ident) => ident.begin(),
            Self::BasicLit(lit) => lit.begin(),
            Self::CommentGroup(group) => group.begin(),
            Self::Comment(comment) => comment.slash,
        }
    }

    /// Returns `true` for placeholder nodes left by error recovery.
    #[must_use]
    pub const fn is_bad(&self) -> bool {
        matches!(
            self,
            Self::Decl(Decl::Bad { .. }) | Self::Type(Type::Bad { .. }) | Self::Expr(Expr::Bad { .. })
        )
    }

    /// Returns `true` for nodes without children.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.is_bad()
            || matches!(
                self,
                Self::Ident(_) | Self::BasicLit(_) | Self::CommentGroup(_) | Self::Comment(_)
            )
    }

    /// A short label for the node kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Package(_) => "Package",
            Self::File(_) => "File",
            Self::Decl(Decl::Bad { .. }) => "BadDecl",
            Self::Decl(Decl::Gen(_)) => "GenDecl",
            Self::Decl(Decl::Bean(_)) => "BeanDecl",
            Self::Spec(Spec::Import(_)) => "ImportSpec",
            Self::Spec(Spec::Const(_)) => "ConstSpec",
            Self::FieldList(_) => "FieldList",
            Self::Field(_) => "Field",
            Self::Type(Type::Bad { .. }) => "BadType",
            Self::Type(Type::Basic { .. }) => "BasicType",
            Self::Type(Type::Array(_)) => "ArrayType",
            Self::Type(Type::Vector(_)) => "VectorType",
            Self::Type(Type::Map(_)) => "MapType",
            Self::Type(Type::Struct(_)) => "StructType",
            Self::Type(Type::Func(_)) => "FuncType",
            Self::Expr(Expr::Bad { .. }) => "BadExpr",
            Self::Expr(_) => "Expr",
            Self::Ident(_) => "Ident",
            Self::BasicLit(_) => "BasicLit",
            Self::CommentGroup(_) => "CommentGroup",
            Self::Comment(_) => "Comment",
        }
    }
}

/// Receives nodes from [`walk`].
pub trait Visitor<'ast> {
    /// Called for every node before its children.
    ///
    /// Returns the visitor to walk the children with, or `None` to skip
    /// them.
    fn visit(&mut self, node: Node<'ast>) -> Option<&mut dyn Visitor<'ast>>;

    /// Called on the returned visitor before the children of a non-terminal
    /// node.
    fn enter(&mut self) {}

    /// Called on the returned visitor after the children of a non-terminal
    /// node.
    fn leave(&mut self) {}
}

/// Walks `node` depth-first in source order.
pub fn walk<'ast>(visitor: &mut dyn Visitor<'ast>, node: Node<'ast>) {
    let Some(visitor) = visitor.visit(node) else {
        return;
    };
    if node.is_terminal() {
        return;
    }
    visitor.enter();
    walk_children(visitor, node);
    visitor.leave();
}

fn walk_opt_group<'ast>(visitor: &mut dyn Visitor<'ast>, group: Option<&'ast CommentGroup>) {
    if let Some(group) = group {
        walk(visitor, Node::CommentGroup(group));
    }
}

fn walk_children<'ast>(v: &mut dyn Visitor<'ast>, node: Node<'ast>) {
    match node {
        Node::Package(package) => {
            for file in package.files.values() {
                walk(v, Node::File(file));
            }
        }
        Node::File(file) => {
            walk_opt_group(v, file.doc.as_ref());
            walk(v, Node::Ident(&file.name));
            for decl in &file.decls {
                walk(v, Node::Decl(decl));
            }
        }
        Node::Decl(Decl::Gen(decl)) => {
            walk_opt_group(v, decl.doc.as_ref());
            for spec in &decl.specs {
                walk(v, Node::Spec(spec));
            }
        }
        Node::Decl(Decl::Bean(decl)) => {
            walk_opt_group(v, decl.doc.as_ref());
            walk(v, Node::Ident(&decl.name));
            if let Some(tag) = &decl.tag {
                walk(v, Node::BasicLit(tag));
            }
            walk(v, Node::FieldList(&decl.fields));
        }
        Node::Spec(Spec::Import(spec)) => {
            walk_opt_group(v, spec.doc.as_ref());
            if let Some(name) = &spec.name {
                walk(v, Node::Ident(name));
            }
            walk(v, Node::BasicLit(&spec.path));
            walk_opt_group(v, spec.comment.as_ref());
        }
        Node::Spec(Spec::Const(spec)) => {
            walk_opt_group(v, spec.doc.as_ref());
            walk(v, Node::Ident(&spec.name));
            if let Some(value) = &spec.value {
                walk(v, Node::Expr(value));
            }
            walk_opt_group(v, spec.comment.as_ref());
        }
        Node::FieldList(list) => {
            for field in &list.list {
                walk(v, Node::Field(field));
            }
        }
        Node::Field(field) => {
            walk_opt_group(v, field.doc.as_ref());
            for option in &field.options {
                walk(v, Node::Ident(option));
            }
            if let Some(ty) = &field.ty {
                walk(v, Node::Type(ty));
            }
            for name in &field.names {
                walk(v, Node::Ident(name));
            }
            if let Some(default) = &field.default {
                walk(v, Node::Expr(default));
            }
            if let Some(tag) = &field.tag {
                walk(v, Node::BasicLit(tag));
            }
            walk_opt_group(v, field.comment.as_ref());
        }
        Node::Type(ty) => match ty {
            Type::Basic { name, .. } => walk(v, Node::Ident(name)),
            Type::Array(array) => {
                walk(v, Node::Type(&array.elem));
                walk(v, Node::Expr(&array.size));
            }
            Type::Vector(vector) => walk(v, Node::Type(&vector.elem)),
            Type::Map(map) => {
                walk(v, Node::Type(&map.key));
                walk(v, Node::Type(&map.value));
            }
            Type::Struct(named) => {
                if let Some(package) = &named.package {
                    walk(v, Node::Ident(package));
                }
                walk(v, Node::Ident(&named.name));
            }
            Type::Func(func) => {
                walk(v, Node::FieldList(&func.params));
                if let Some(result) = &func.result {
                    walk(v, Node::Type(result));
                }
            }
            Type::Bad { .. } => {}
        },
        Node::Expr(expr) => match expr {
            Expr::Ident(ident) => walk(v, Node::Ident(ident)),
            Expr::Lit(lit) => walk(v, Node::BasicLit(lit)),
            Expr::Type(ty) => walk(v, Node::Type(ty)),
            Expr::Bad { .. } => {}
        },
        Node::Decl(Decl::Bad { .. })
        | Node::Ident(_)
        | Node::BasicLit(_)
        | Node::CommentGroup(_)
        | Node::Comment(_) => {}
    }
}

/// Walks `node`, calling `f` for each node. Returning `false` skips the
/// node's children.
pub fn inspect<'ast, F>(node: Node<'ast>, f: F)
where
    F: FnMut(Node<'ast>) -> bool,
{
    walk(&mut Inspector(f), node);
}

struct Inspector<F>(F);

impl<'ast, F> Visitor<'ast> for Inspector<F>
where
    F: FnMut(Node<'ast>) -> bool,
{
    fn visit(&mut self, node: Node<'ast>) -> Option<&mut dyn Visitor<'ast>> {
        if (self.0)(node) { Some(self) } else { None }
    }
}

/// Renders an indented outline of node kinds, one per line.
#[must_use]
pub fn outline(node: Node<'_>) -> String {
    let mut printer = Outline::default();
    walk(&mut printer, node);
    printer.out
}

#[derive(Default)]
struct Outline {
    depth: usize,
    out: String,
}

impl<'ast> Visitor<'ast> for Outline {
    fn visit(&mut self, node: Node<'ast>) -> Option<&mut dyn Visitor<'ast>> {
        let _ = write!(self.out, "{:indent$}{}", "", node.kind_name(), indent = self.depth * 2);
        match node {
            Node::Ident(ident) => {
                let _ = write!(self.out, " {}", ident.name);
            }
            Node::BasicLit(lit) => {
                let _ = write!(self.out, " {}", lit.value);
            }
            _ => {}
        }
        self.out.push('\n');
        Some(self)
    }

    fn enter(&mut self) {
        self.depth += 1;
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}
