// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! mid schema compiler core.
//!
//! This crate contains the front end of the mid schema language:
//! - Position tracking across many files ([`source_analysis::FileSet`])
//! - Lexical analysis and parsing, with per-file name resolution
//! - Package linking (cross-file and cross-package name resolution)
//! - Lowering to a serialisable IR for code generators ([`build`])
//!
//! [`compiler::compile`] runs the whole pipeline. Problems never abort a
//! compilation: every stage reports [`Diagnostic`](source_analysis::Diagnostic)s
//! and carries on.

pub mod ast;
pub mod ast_walker;
pub mod build;
pub mod compiler;
pub mod semantic_analysis;
pub mod source_analysis;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::build::{Bean, Field, Ir, Tag, Type};
    pub use crate::compiler::{Compilation, SourceInput, compile};
    pub use crate::source_analysis::{Diagnostic, FileSet, Pos, Severity, Span};
}
