// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions for midlang.
//!
//! **DDD Context:** Source Analysis
//!
//! The AST mirrors the source closely: every node records the global
//! [`Pos`] it starts at, comments are kept in [`CommentGroup`]s, and
//! literals keep their raw text.
//!
//! # Design Philosophy
//!
//! - **Error recovery** - Malformed input becomes [`Decl::Bad`], [`Type::Bad`]
//!   or [`Expr::Bad`] rather than a parse failure
//! - **No back-pointers** - Identifier resolution lives in the per-file
//!   [`Resolutions`] table, keyed by [`IdentId`], and objects refer back to
//!   their declaration through [`DeclRef`](crate::semantic_analysis::DeclRef)
//!   indices
//!
//! # Example
//!
//! ```text
//! // Source: struct User { string Name `json:"name"` }
//! Decl::Bean(BeanDecl {
//!     kind: BeanKind::Struct,
//!     name: Ident { name: "User", .. },
//!     fields: FieldList {
//!         list: vec![Field {
//!             ty: Some(Type::Basic { name: Ident { name: "string", .. }, .. }),
//!             names: vec![Ident { name: "Name", .. }],
//!             tag: Some(BasicLit { value: "`json:\"name\"`", .. }),
//!             ..
//!         }],
//!         ..
//!     },
//!     ..
//! })
//! ```

use std::collections::BTreeMap;

use ecow::EcoString;

use crate::semantic_analysis::{ObjectId, ScopeId};
use crate::source_analysis::{BuiltinType, FileId, Pos};

// ============================================================================
// Identifiers and literals
// ============================================================================

/// Index of an identifier within its file, used as a key into
/// [`Resolutions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentId(pub u32);

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub id: IdentId,
    pub name: EcoString,
    pub pos: Pos,
}

impl Ident {
    #[must_use]
    pub const fn begin(&self) -> Pos {
        self.pos
    }

    /// Returns the position just past the identifier.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "identifiers are shorter than their file"
    )]
    pub fn end(&self) -> Pos {
        Pos::new(self.pos.raw() + self.name.len() as u32)
    }

    /// Returns `true` for the blank identifier `_`.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// The kind of a [`BasicLit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LitKind {
    Int,
    Float,
    Char,
    String,
}

/// A literal, with its raw source text.
///
/// String literals keep their quotes or backticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicLit {
    pub pos: Pos,
    pub kind: LitKind,
    pub value: EcoString,
}

impl BasicLit {
    #[must_use]
    pub const fn begin(&self) -> Pos {
        self.pos
    }
}

// ============================================================================
// Comments
// ============================================================================

/// A single `//` or `/* */` comment, markers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Position of the leading `/`.
    pub slash: Pos,
    pub text: EcoString,
}

/// A run of comments with no blank line or token between them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentGroup {
    pub list: Vec<Comment>,
}

impl CommentGroup {
    #[must_use]
    pub fn begin(&self) -> Pos {
        self.list.first().map_or(Pos::NONE, |c| c.slash)
    }

    /// Joins the raw comment texts with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        let texts: Vec<&str> = self.list.iter().map(|c| c.text.as_str()).collect();
        texts.join("\n")
    }
}

// ============================================================================
// Expressions and types
// ============================================================================

/// A value: a constant's initialiser, an enum member's value or an array
/// size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Placeholder for unparseable input spanning `from..to`.
    Bad { from: Pos, to: Pos },
    Ident(Ident),
    Lit(BasicLit),
    Type(Box<Type>),
}

impl Expr {
    #[must_use]
    pub fn begin(&self) -> Pos {
        match self {
            Self::Bad { from, .. } => *from,
            Self::Ident(ident) => ident.pos,
            Self::Lit(lit) => lit.pos,
            Self::Type(ty) => ty.begin(),
        }
    }
}

/// A type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Placeholder for an unparseable type spanning `from..to`.
    Bad { from: Pos, to: Pos },
    /// A predeclared scalar type: `int32`, `string`, `any` and so on.
    Basic { name: Ident, builtin: BuiltinType },
    /// `array<Elem, Size>`
    Array(Box<ArrayType>),
    /// `vector<Elem>`
    Vector(Box<VectorType>),
    /// `map<Key, Value>`
    Map(Box<MapType>),
    /// A named type, optionally package-qualified: `User` or `pkg.User`.
    Struct(StructType),
    /// A service method signature.
    Func(Box<FuncType>),
}

impl Type {
    #[must_use]
    pub fn begin(&self) -> Pos {
        match self {
            Self::Bad { from, .. } => *from,
            Self::Basic { name, .. } => name.pos,
            Self::Array(array) => array.pos,
            Self::Vector(vector) => vector.pos,
            Self::Map(map) => map.pos,
            Self::Struct(named) => named.begin(),
            Self::Func(func) => func.params.opening,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    /// Position of the `array` keyword.
    pub pos: Pos,
    pub elem: Type,
    pub size: Expr,
    /// Position of the closing `>`.
    pub closing: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorType {
    pub pos: Pos,
    pub elem: Type,
    pub closing: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapType {
    pub pos: Pos,
    pub key: Type,
    pub value: Type,
    pub closing: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    /// The qualifier in `pkg.Name`.
    pub package: Option<Ident>,
    pub name: Ident,
}

impl StructType {
    #[must_use]
    pub fn begin(&self) -> Pos {
        self.package.as_ref().map_or(self.name.pos, |pkg| pkg.pos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncType {
    pub params: FieldList,
    pub result: Option<Type>,
}

// ============================================================================
// Fields
// ============================================================================

/// A field, method, enum member or extends marker inside a bean body, or a
/// method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub doc: Option<CommentGroup>,
    /// `required` / `optional` markers, in source order.
    pub options: Vec<Ident>,
    /// Absent for enum members.
    pub ty: Option<Type>,
    /// Empty for extends markers and unnamed parameters.
    pub names: Vec<Ident>,
    /// An enum member's value.
    pub default: Option<Expr>,
    pub tag: Option<BasicLit>,
    pub comment: Option<CommentGroup>,
}

impl Field {
    #[must_use]
    pub fn begin(&self) -> Pos {
        if let Some(option) = self.options.first() {
            return option.pos;
        }
        if let Some(ty) = &self.ty {
            return ty.begin();
        }
        self.names.first().map_or(Pos::NONE, |name| name.pos)
    }
}

/// A bracketed list of fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldList {
    /// Position of the opening `{` or `(`.
    pub opening: Pos,
    pub list: Vec<Field>,
    /// Position of the closing `}` or `)`.
    pub closing: Pos,
}

impl FieldList {
    /// Counts named entries; an entry with no name counts once.
    #[must_use]
    pub fn num_fields(&self) -> usize {
        self.list.iter().map(|field| field.names.len().max(1)).sum()
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// An `import` spec: `alias "path"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub doc: Option<CommentGroup>,
    /// The alias, or `.` for a dot import.
    pub name: Option<Ident>,
    pub path: BasicLit,
    pub comment: Option<CommentGroup>,
}

impl ImportSpec {
    #[must_use]
    pub fn begin(&self) -> Pos {
        self.name.as_ref().map_or(self.path.pos, |name| name.pos)
    }
}

/// A `const` spec: `Name = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstSpec {
    pub doc: Option<CommentGroup>,
    pub name: Ident,
    pub value: Option<Expr>,
    pub comment: Option<CommentGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spec {
    Import(ImportSpec),
    Const(ConstSpec),
}

impl Spec {
    #[must_use]
    pub fn begin(&self) -> Pos {
        match self {
            Self::Import(spec) => spec.begin(),
            Self::Const(spec) => spec.name.pos,
        }
    }
}

/// The keyword introducing a [`GenDecl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenKind {
    Import,
    Const,
}

/// An `import` or `const` declaration, grouped or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenDecl {
    pub doc: Option<CommentGroup>,
    /// Position of the keyword.
    pub tok_pos: Pos,
    pub keyword: GenKind,
    /// Position of `(`, or `Pos::NONE` when ungrouped.
    pub lparen: Pos,
    pub specs: Vec<Spec>,
    /// Position of `)`, or `Pos::NONE` when ungrouped.
    pub rparen: Pos,
}

impl GenDecl {
    #[must_use]
    pub const fn is_grouped(&self) -> bool {
        self.lparen.is_valid()
    }
}

/// What kind of bean a [`BeanDecl`] declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeanKind {
    Struct,
    Protocol,
    Service,
    Enum,
}

impl BeanKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Protocol => "protocol",
            Self::Service => "service",
            Self::Enum => "enum",
        }
    }
}

/// A `struct`, `protocol`, `service` or `enum` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanDecl {
    pub kind: BeanKind,
    /// Position of the keyword.
    pub pos: Pos,
    pub doc: Option<CommentGroup>,
    pub name: Ident,
    pub tag: Option<BasicLit>,
    pub fields: FieldList,
}

impl BeanDecl {
    /// Yields the types named by extends markers, in source order.
    pub fn extends(&self) -> impl Iterator<Item = &Type> {
        self.fields
            .list
            .iter()
            .filter(|field| field.names.is_empty())
            .filter_map(|field| field.ty.as_ref())
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// Placeholder for an unparseable declaration spanning `from..to`.
    Bad { from: Pos, to: Pos },
    Gen(GenDecl),
    Bean(BeanDecl),
}

impl Decl {
    #[must_use]
    pub const fn begin(&self) -> Pos {
        match self {
            Self::Bad { from, .. } => *from,
            Self::Gen(decl) => decl.tok_pos,
            Self::Bean(decl) => decl.pos,
        }
    }
}

// ============================================================================
// Files and packages
// ============================================================================

/// Identifier resolutions for one file, indexed by [`IdentId`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolutions {
    objects: Vec<Option<ObjectId>>,
}

impl Resolutions {
    /// Records that `ident` refers to `object`.
    pub fn set(&mut self, ident: IdentId, object: ObjectId) {
        let index = ident.0 as usize;
        if self.objects.len() <= index {
            self.objects.resize(index + 1, None);
        }
        self.objects[index] = Some(object);
    }

    /// Returns the object `ident` refers to, if resolved.
    #[must_use]
    pub fn get(&self, ident: IdentId) -> Option<ObjectId> {
        self.objects.get(ident.0 as usize).copied().flatten()
    }

    /// Returns the number of resolved identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub id: FileId,
    pub filename: EcoString,
    /// The comment group directly above `package`.
    pub doc: Option<CommentGroup>,
    /// Position of the `package` keyword.
    pub package: Pos,
    pub name: Ident,
    pub decls: Vec<Decl>,
    /// The file scope, holding this file's top-level declarations.
    pub scope: ScopeId,
    /// Copies of every import spec, in source order.
    pub imports: Vec<ImportSpec>,
    /// Identifiers not resolved so far.
    pub unresolved: Vec<Ident>,
    /// Every comment group, in source order.
    pub comments: Vec<CommentGroup>,
    pub resolutions: Resolutions,
}

impl File {
    #[must_use]
    pub const fn begin(&self) -> Pos {
        self.package
    }
}

/// The files of one package, linked together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: EcoString,
    pub scope: ScopeId,
    /// Imported package objects, by package id.
    pub imports: BTreeMap<String, ObjectId>,
    /// Files by name.
    pub files: BTreeMap<String, File>,
}

impl Package {
    /// Returns the first position of the first file, by name.
    #[must_use]
    pub fn begin(&self) -> Pos {
        self.files.values().next().map_or(Pos::NONE, File::begin)
    }
}
