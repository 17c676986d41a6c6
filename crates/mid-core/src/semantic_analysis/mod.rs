// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Semantic analysis for midlang.
//!
//! This module holds the symbol table shared by the parser and the linker:
//! - Scopes and declared objects (via `scope` module)
//! - Cross-file and cross-package resolution (via `linker` module)
//!
//! The parser fills one file scope per file. [`link`] merges them into
//! package scopes and resolves what the parser could not.

pub mod linker;
pub mod scope;


pub use linker::{LinkOutput, UnresolvedIdent, import_id, link};
pub use scope::{
    DeclRef, ObjKind, Object, ObjectId, ParsedFile, QualifiedRef, Scope, ScopeId, SymbolTable,
};
