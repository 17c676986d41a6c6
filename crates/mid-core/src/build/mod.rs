// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lowering of linked packages to the [`Ir`].
//!
//! **DDD Context:** Build
//!
//! The builder never fails. Anything it cannot lower faithfully becomes
//! [`Type::Invalid`], [`Expr::Invalid`] or an empty [`Tag`], and is reported
//! as a warning:
//!
//! - `Bad` nodes left by the parser
//! - tag literals that do not unquote
//! - array sizes that are not integer constants
//!
//! Named-constant array sizes are followed through the resolutions of the
//! file that declares each constant, so `array<T, N>` with `const N = M` and
//! `const M = 4` in another file of the package lowers to a size of 4.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument};

use crate::ast::{self, Decl, Spec};
use crate::ast_walker::{Node, inspect};
use crate::semantic_analysis::{DeclRef, ObjKind, SymbolTable, import_id};
use crate::source_analysis::{Diagnostic, FileId, Pos, Span, unquote};

mod ir;
mod tag;


pub use ir::{
    AmbiguousName, ArraySize, Bean, BeanKind, ConstSpec, Expr, Field, File, GenDecl, ImportSpec,
    Ir, IrError, LitKind, Package, Type,
};
pub use tag::Tag;

/// How many constants deep an array size may refer through.
const MAX_CONST_DEPTH: usize = 16;

/// Lowers linked packages to IR.
///
/// Packages come out sorted by name and files by filename.
#[instrument(skip_all, fields(packages = packages.len()))]
pub fn build(
    packages: &BTreeMap<String, ast::Package>,
    symbols: &SymbolTable,
) -> (Ir, Vec<Diagnostic>) {
    let files: HashMap<FileId, &ast::File> = packages
        .values()
        .flat_map(|package| package.files.values())
        .map(|file| (file.id, file))
        .collect();
    let mut builder = Builder {
        symbols,
        files,
        diagnostics: Vec::new(),
    };

    let ir = Ir {
        packages: packages
            .values()
            .map(|package| builder.package(package))
            .collect(),
    };
    (ir, builder.diagnostics)
}

struct Builder<'a> {
    symbols: &'a SymbolTable,
    /// Every file of the compilation, for following constants across files.
    files: HashMap<FileId, &'a ast::File>,
    diagnostics: Vec<Diagnostic>,
}

impl Builder<'_> {
    fn package(&mut self, package: &ast::Package) -> Package {
        let mut imports = BTreeMap::new();
        for file in package.files.values() {
            for spec in &file.imports {
                let Some(id) = import_id(&spec.path.value) else {
                    continue;
                };
                if package.imports.contains_key(&id) {
                    let path = unquote(&spec.path.value).unwrap_or_default();
                    imports.entry(id).or_insert(path);
                }
            }
        }

        let files: Vec<File> = package.files.values().map(|file| self.file(file)).collect();
        debug!(
            package = %package.name,
            beans = files.iter().map(|file| file.beans.len()).sum::<usize>(),
            "built package"
        );
        Package {
            name: package.name.to_string(),
            imports,
            files,
        }
    }

    fn file(&mut self, file: &ast::File) -> File {
        self.report_bad_nodes(file);

        let mut beans = Vec::new();
        let mut decls = Vec::new();
        for decl in &file.decls {
            match decl {
                Decl::Bad { .. } => {}
                Decl::Gen(gen_decl) => decls.push(self.gen_decl(file, gen_decl)),
                Decl::Bean(bean) => beans.push(self.bean(file, bean)),
            }
        }
        File {
            filename: file.filename.to_string(),
            doc: doc(file.doc.as_ref()),
            package: file.name.name.to_string(),
            beans,
            decls,
            unresolved: file
                .unresolved
                .iter()
                .map(|ident| ident.name.to_string())
                .collect(),
        }
    }

    fn report_bad_nodes(&mut self, file: &ast::File) {
        let diagnostics = &mut self.diagnostics;
        inspect(Node::File(file), |node| {
            let (what, from, to) = match node {
                Node::Decl(Decl::Bad { from, to }) => ("declaration", *from, *to),
                Node::Type(ast::Type::Bad { from, to }) => ("type", *from, *to),
                Node::Expr(ast::Expr::Bad { from, to }) => ("expression", *from, *to),
                _ => return true,
            };
            diagnostics.push(Diagnostic::warning(
                format!("malformed {what} lowered as invalid"),
                Span::new(from.raw(), to.raw().max(from.raw())),
            ));
            false
        });
    }

    fn gen_decl(&mut self, file: &ast::File, decl: &ast::GenDecl) -> GenDecl {
        let mut lowered = GenDecl {
            doc: doc(decl.doc.as_ref()),
            imports: Vec::new(),
            consts: Vec::new(),
        };
        for spec in &decl.specs {
            match spec {
                Spec::Import(spec) => lowered.imports.push(ImportSpec {
                    doc: doc(spec.doc.as_ref()),
                    name: spec
                        .name
                        .as_ref()
                        .map(|name| name.name.to_string())
                        .unwrap_or_default(),
                    package: unquote(&spec.path.value)
                        .unwrap_or_else(|| spec.path.value.to_string()),
                    comment: comment(spec.comment.as_ref()),
                }),
                Spec::Const(spec) => lowered.consts.push(ConstSpec {
                    doc: doc(spec.doc.as_ref()),
                    name: spec.name.name.to_string(),
                    value: spec
                        .value
                        .as_ref()
                        .map_or(Expr::Invalid, |value| self.expr(file, value)),
                    comment: comment(spec.comment.as_ref()),
                }),
            }
        }
        lowered
    }

    fn bean(&mut self, file: &ast::File, decl: &ast::BeanDecl) -> Bean {
        let takes_extends = decl.kind != ast::BeanKind::Enum;
        let mut extends = Vec::new();
        let mut fields = Vec::new();
        for field in &decl.fields.list {
            if takes_extends && field.names.is_empty() {
                if let Some(ty) = &field.ty {
                    extends.push(self.ty(file, ty));
                }
                continue;
            }
            fields.push(self.field(file, field));
        }
        Bean {
            id: None,
            kind: decl.kind.into(),
            doc: doc(decl.doc.as_ref()),
            name: decl.name.name.to_string(),
            extends,
            tag: self.tag(decl.tag.as_ref()),
            fields,
            comment: String::new(),
        }
    }

    fn field(&mut self, file: &ast::File, field: &ast::Field) -> Field {
        Field {
            doc: doc(field.doc.as_ref()),
            options: field
                .options
                .iter()
                .map(|option| option.name.to_string())
                .collect(),
            ty: field.ty.as_ref().map(|ty| self.ty(file, ty)),
            names: field.names.iter().map(|name| name.name.to_string()).collect(),
            default: field.default.as_ref().map(|value| self.expr(file, value)),
            tag: self.tag(field.tag.as_ref()),
            comment: comment(field.comment.as_ref()),
        }
    }

    fn ty(&mut self, file: &ast::File, ty: &ast::Type) -> Type {
        match ty {
            ast::Type::Bad { .. } => Type::Invalid,
            ast::Type::Basic { name, .. } => Type::Basic {
                name: name.name.to_string(),
            },
            ast::Type::Array(array) => Type::Array {
                elem: Box::new(self.ty(file, &array.elem)),
                size: self.array_size(file, &array.size),
            },
            ast::Type::Vector(vector) => Type::Vector {
                elem: Box::new(self.ty(file, &vector.elem)),
            },
            ast::Type::Map(map) => Type::Map {
                key: Box::new(self.ty(file, &map.key)),
                value: Box::new(self.ty(file, &map.value)),
            },
            ast::Type::Struct(named) => Type::Struct {
                package: named
                    .package
                    .as_ref()
                    .map(|package| self.package_id(file, package))
                    .unwrap_or_default(),
                name: named.name.name.to_string(),
            },
            ast::Type::Func(func) => Type::Func {
                params: func
                    .params
                    .list
                    .iter()
                    .map(|param| self.field(file, param))
                    .collect(),
                result: func
                    .result
                    .as_ref()
                    .map(|result| Box::new(self.ty(file, result))),
            },
        }
    }

    /// Returns the id of the package a qualifier names, seeing through
    /// import aliases.
    fn package_id(&self, file: &ast::File, qualifier: &ast::Ident) -> String {
        let object = file
            .resolutions
            .get(qualifier.id)
            .map(|id| self.symbols.object(id));
        match object {
            Some(object) => match &object.decl {
                DeclRef::Package(id) => id.to_string(),
                _ => qualifier.name.to_string(),
            },
            None => qualifier.name.to_string(),
        }
    }

    fn array_size(&mut self, file: &ast::File, size: &ast::Expr) -> ArraySize {
        match size {
            ast::Expr::Lit(lit) if lit.kind == ast::LitKind::Int => {
                match ir::parse_int(&lit.value) {
                    Some(n) => ArraySize::Literal(n),
                    None => {
                        self.warn_size(&lit.value, lit.pos);
                        ArraySize::Invalid
                    }
                }
            }
            ast::Expr::Ident(ident) => {
                let value = self.const_value(file, ident, 0);
                if value.is_none() {
                    self.warn_size(&ident.name, ident.pos);
                }
                ArraySize::Const {
                    name: ident.name.to_string(),
                    value,
                }
            }
            // already reported as a bad node
            ast::Expr::Bad { .. } => ArraySize::Invalid,
            ast::Expr::Lit(lit) => {
                self.warn_size(&lit.value, lit.pos);
                ArraySize::Invalid
            }
            ast::Expr::Type(ty) => {
                self.warn_size("type", ty.begin());
                ArraySize::Invalid
            }
        }
    }

    fn warn_size(&mut self, text: &str, pos: Pos) {
        let end = pos.raw() + u32::try_from(text.len()).unwrap_or(0);
        self.diagnostics.push(Diagnostic::warning(
            format!("array size `{text}` is not an integer constant"),
            Span::new(pos.raw(), end),
        ));
    }

    /// Follows `ident` to the integer value of the constant it names.
    fn const_value(&self, file: &ast::File, ident: &ast::Ident, depth: usize) -> Option<u64> {
        if depth >= MAX_CONST_DEPTH {
            return None;
        }
        let object = self.symbols.object(file.resolutions.get(ident.id)?);
        if object.kind != ObjKind::Const {
            return None;
        }
        let DeclRef::Spec {
            file: decl_file,
            decl,
            spec,
        } = &object.decl
        else {
            return None;
        };
        let decl_file = *self.files.get(decl_file)?;
        let Some(Decl::Gen(gen_decl)) = decl_file.decls.get(*decl) else {
            return None;
        };
        let Some(Spec::Const(spec)) = gen_decl.specs.get(*spec) else {
            return None;
        };
        match spec.value.as_ref()? {
            ast::Expr::Lit(lit) if lit.kind == ast::LitKind::Int => ir::parse_int(&lit.value),
            ast::Expr::Ident(next) => self.const_value(decl_file, next, depth + 1),
            _ => None,
        }
    }

    fn expr(&mut self, file: &ast::File, expr: &ast::Expr) -> Expr {
        match expr {
            ast::Expr::Bad { .. } => Expr::Invalid,
            ast::Expr::Ident(ident) => Expr::Ident(ident.name.to_string()),
            ast::Expr::Lit(lit) => Expr::Lit {
                kind: lit.kind.into(),
                value: lit.value.to_string(),
            },
            ast::Expr::Type(ty) => Expr::Type(self.ty(file, ty)),
        }
    }

    fn tag(&mut self, lit: Option<&ast::BasicLit>) -> Tag {
        let Some(lit) = lit else {
            return Tag::default();
        };
        if let Some(text) = unquote(&lit.value) {
            return Tag::new(text);
        }
        let end = lit.pos.raw() + u32::try_from(lit.value.len()).unwrap_or(0);
        self.diagnostics.push(Diagnostic::warning(
            "malformed tag literal ignored",
            Span::new(lit.pos.raw(), end),
        ));
        Tag::default()
    }
}

fn doc(group: Option<&ast::CommentGroup>) -> String {
    group.map(|group| group.text() + "\n").unwrap_or_default()
}

fn comment(group: Option<&ast::CommentGroup>) -> String {
    group.map(ast::CommentGroup::text).unwrap_or_default()
}
