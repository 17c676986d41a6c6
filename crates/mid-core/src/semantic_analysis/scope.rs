// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical scopes and the objects declared in them.
//!
//! **DDD Context:** Semantic Analysis
//!
//! Scopes and objects live in one arena, the [`SymbolTable`], and refer to
//! each other through [`ScopeId`] and [`ObjectId`] handles. A compilation has
//! one package scope per package, one file scope per file (nested in
//! nothing until the linker merges it) and one scope per bean body nested in
//! its file scope.

use std::collections::HashMap;

use ecow::EcoString;

use crate::ast::{File, Ident};
use crate::source_analysis::{FileId, Pos};

/// Handle to a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub(crate) u32);

/// Handle to an [`Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub(crate) u32);

/// What a named [`Object`] is.
///
/// **DDD Context:** Semantic Analysis - Value Object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    /// For error handling.
    Bad,
    /// An imported package.
    Pkg,
    /// A constant or enum member.
    Const,
    /// A field.
    Var,
    /// A struct, protocol, service or enum.
    Bean,
    /// A service method.
    Fun,
}

impl ObjKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bad => "bad",
            Self::Pkg => "package",
            Self::Const => "const",
            Self::Var => "var",
            Self::Bean => "bean",
            Self::Fun => "func",
        }
    }
}

/// Where an [`Object`] was declared.
///
/// Indices refer to `File::decls`, then to the spec or field within that
/// declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclRef {
    None,
    /// An imported package, by id.
    Package(EcoString),
    /// A bean declaration.
    Decl { file: FileId, decl: usize },
    /// A const spec.
    Spec {
        file: FileId,
        decl: usize,
        spec: usize,
    },
    /// A field, method or enum member of a bean.
    Field {
        file: FileId,
        decl: usize,
        field: usize,
    },
}

/// A named language entity.
///
/// **DDD Context:** Semantic Analysis - Entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjKind,
    pub name: EcoString,
    pub decl: DeclRef,
    /// Position of the declaring identifier.
    pub pos: Pos,
    /// The `iota` of a constant or the ordinal of an enum member.
    pub data: Option<i64>,
}

impl Object {
    /// Creates an object declared by `ident`.
    #[must_use]
    pub fn new(kind: ObjKind, ident: &Ident, decl: DeclRef) -> Self {
        Self {
            kind,
            name: ident.name.clone(),
            decl,
            pos: ident.pos,
            data: None,
        }
    }

    /// Sets the payload.
    #[must_use]
    pub const fn with_data(mut self, data: i64) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub const fn begin(&self) -> Pos {
        self.pos
    }
}

/// A map from names to objects, with an optional enclosing scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    outer: Option<ScopeId>,
    objects: HashMap<EcoString, ObjectId>,
}

impl Scope {
    #[must_use]
    pub const fn outer(&self) -> Option<ScopeId> {
        self.outer
    }

    /// Returns the object declared here under `name`, ignoring outer scopes.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ObjectId> {
        self.objects.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// The arena holding every scope and object of a compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    objects: Vec<Object>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope nested in `outer`.
    pub fn new_scope(&mut self, outer: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(next_index(self.scopes.len()));
        self.scopes.push(Scope {
            outer,
            objects: HashMap::new(),
        });
        id
    }

    /// Adds an object that is not yet in any scope.
    pub fn new_object(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(next_index(self.objects.len()));
        self.objects.push(object);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` came from a different table.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// # Panics
    ///
    /// Panics if `id` came from a different table.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0 as usize]
    }

    /// Inserts `object` into `scope` under its name.
    ///
    /// If the scope already holds an object with that name, the scope is left
    /// unchanged and the existing object is returned.
    pub fn insert(&mut self, scope: ScopeId, object: ObjectId) -> Option<ObjectId> {
        let name = self.object(object).name.clone();
        let objects = &mut self.scopes[scope.0 as usize].objects;
        if let Some(&existing) = objects.get(&name) {
            return Some(existing);
        }
        objects.insert(name, object);
        None
    }

    /// Looks `name` up in `scope` only.
    #[must_use]
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<ObjectId> {
        self.scope(scope).get(name)
    }

    /// Looks `name` up in `scope` and then in each enclosing scope.
    #[must_use]
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<ObjectId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(object) = scope.get(name) {
                return Some(object);
            }
            current = scope.outer;
        }
        None
    }

    /// Returns the objects of `scope` ordered by declaration position.
    #[must_use]
    pub fn objects_in(&self, scope: ScopeId) -> Vec<ObjectId> {
        let mut objects: Vec<ObjectId> = self.scope(scope).objects.values().copied().collect();
        objects.sort_by_key(|&id| (self.object(id).pos, id));
        objects
    }
}

/// A `pkg.Name` reference waiting for the linker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedRef {
    pub package: Ident,
    pub name: Ident,
}

/// A file as the parser leaves it: names declared in its own file scope
/// are resolved, everything else is pending.
///
/// The linker consumes these and produces the resolved [`File`]s of each
/// [`Package`](crate::ast::Package).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// The syntax tree. `file.unresolved` lists the identifiers that could
    /// not be resolved within the file.
    pub file: File,
    /// Package-qualified references, in source order.
    pub qualified: Vec<QualifiedRef>,
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "more than 4G scopes or objects cannot fit in memory"
)]
const fn next_index(len: usize) -> u32 {
    len as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::IdentId;

    fn ident(name: &str, pos: u32) -> Ident {
        Ident {
            id: IdentId(0),
            name: name.into(),
            pos: Pos::new(pos),
        }
    }

    #[test]
    fn insert_keeps_first_declaration() {
        let mut table = SymbolTable::new();
        let scope = table.new_scope(None);
        let first = table.new_object(Object::new(ObjKind::Var, &ident("x", 1), DeclRef::None));
        let second = table.new_object(Object::new(ObjKind::Var, &ident("x", 9), DeclRef::None));
        assert_eq!(table.insert(scope, first), None);
        assert_eq!(table.insert(scope, second), Some(first));
        assert_eq!(table.lookup(scope, "x"), Some(first));
        assert_eq!(table.scope(scope).len(), 1);
    }

    #[test]
    fn resolve_walks_outward() {
        let mut table = SymbolTable::new();
        let outer = table.new_scope(None);
        let inner = table.new_scope(Some(outer));
        let a = table.new_object(Object::new(ObjKind::Bean, &ident("A", 1), DeclRef::None));
        let shadow = table.new_object(Object::new(ObjKind::Var, &ident("A", 5), DeclRef::None));
        table.insert(outer, a);
        assert_eq!(table.lookup(inner, "A"), None);
        assert_eq!(table.resolve(inner, "A"), Some(a));
        table.insert(inner, shadow);
        assert_eq!(table.resolve(inner, "A"), Some(shadow));
        assert_eq!(table.resolve(outer, "A"), Some(a));
        assert_eq!(table.resolve(inner, "B"), None);
    }

    #[test]
    fn objects_in_position_order() {
        let mut table = SymbolTable::new();
        let scope = table.new_scope(None);
        for (name, pos) in [("c", 30), ("a", 10), ("b", 20)] {
            let id = table.new_object(Object::new(ObjKind::Const, &ident(name, pos), DeclRef::None));
            table.insert(scope, id);
        }
        let names: Vec<_> = table
            .objects_in(scope)
            .into_iter()
            .map(|id| table.object(id).name.clone())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn object_data() {
        let object = Object::new(ObjKind::Const, &ident("Red", 4), DeclRef::None).with_data(2);
        assert_eq!(object.data, Some(2));
        assert_eq!(object.begin(), Pos::new(4));
        assert_eq!(object.kind.as_str(), "const");
    }
}
