// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The compilation pipeline: parse every file, link packages, build IR.
//!
//! **DDD Context:** Compilation
//!
//! ```
//! use mid_core::compiler::{SourceInput, compile};
//!
//! let compilation = compile(&[SourceInput::new(
//!     "user.mid",
//!     "package app\nstruct User {\n  string Name\n}\n",
//! )]);
//! assert!(!compilation.has_errors());
//! let user = compilation.ir.package("app").unwrap().find_bean("User").unwrap();
//! assert_eq!(user.num_fields(), 1);
//! ```

use std::collections::BTreeMap;

use tracing::{Level, debug, enabled, info, instrument, trace};

use crate::ast::Package;
use crate::ast_walker::{Node, outline};
use crate::build::{Ir, build};
use crate::semantic_analysis::{SymbolTable, UnresolvedIdent, link};
use crate::source_analysis::{Diagnostic, FileSet, Span, parse_file, sort_diagnostics};

/// One source file to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub name: String,
    pub content: String,
}

impl SourceInput {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Everything a compilation produced.
#[derive(Debug)]
pub struct Compilation {
    pub file_set: FileSet,
    pub symbols: SymbolTable,
    pub packages: BTreeMap<String, Package>,
    pub ir: Ir,
    /// Sorted by filename, line and column.
    pub diagnostics: Vec<Diagnostic>,
    pub unresolved: Vec<UnresolvedIdent>,
}

impl Compilation {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Renders `diagnostic` as `file:line:col: message`.
    #[must_use]
    pub fn render_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let position = diagnostic.position(&self.file_set);
        if position.is_valid() {
            format!("{position}: {}", diagnostic.message)
        } else {
            diagnostic.message.to_string()
        }
    }

    /// Reports each unresolved identifier as an error.
    #[must_use]
    pub fn unresolved_errors(&self) -> Vec<Diagnostic> {
        self.unresolved
            .iter()
            .map(|ident| {
                let end = ident.pos.raw() + u32::try_from(ident.name.len()).unwrap_or(0);
                Diagnostic::error(
                    format!("undefined: {}", ident.name),
                    Span::new(ident.pos.raw(), end),
                )
            })
            .collect()
    }
}

/// Compiles `sources` as one program.
///
/// Files are parsed in the order given; nothing after parsing depends on
/// that order.
#[instrument(skip_all, fields(files = sources.len()))]
pub fn compile(sources: &[SourceInput]) -> Compilation {
    let mut file_set = FileSet::new();
    let mut symbols = SymbolTable::new();
    let mut diagnostics = Vec::new();
    let mut parsed = Vec::with_capacity(sources.len());

    for source in sources {
        match parse_file(&mut file_set, &mut symbols, &source.name, &source.content) {
            Ok((file, file_diagnostics)) => {
                if enabled!(Level::TRACE) {
                    trace!(file = %source.name, "\n{}", outline(Node::File(&file.file)));
                }
                diagnostics.extend(file_diagnostics);
                parsed.push(file);
            }
            Err(err) => {
                debug!(file = %source.name, error = %err, "cannot register file");
                diagnostics.push(Diagnostic::error(
                    format!("{}: {err}", source.name),
                    Span::default(),
                ));
            }
        }
    }

    let linked = link(parsed, &mut symbols, &file_set);
    diagnostics.extend(linked.diagnostics);

    let (ir, build_diagnostics) = build(&linked.packages, &symbols);
    diagnostics.extend(build_diagnostics);
    sort_diagnostics(&mut diagnostics, &file_set);

    info!(
        packages = ir.packages.len(),
        diagnostics = diagnostics.len(),
        unresolved = linked.unresolved.len(),
        "compiled"
    );
    Compilation {
        file_set,
        symbols,
        packages: linked.packages,
        ir,
        diagnostics,
        unresolved: linked.unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(compilation: &Compilation) -> Vec<String> {
        compilation
            .diagnostics
            .iter()
            .map(|d| compilation.render_diagnostic(d))
            .collect()
    }

    #[test]
    fn diagnostics_from_every_stage_are_sorted() {
        let compilation = compile(&[
            SourceInput::new("b.mid", "package app\nstruct A {\n  array<int32, X> V\n}\n"),
            SourceInput::new("a.mid", "package app\nimport \"nowhere\"\nstruct A {\n}\n"),
        ]);
        assert_eq!(
            rendered(&compilation),
            [
                "a.mid:2:8: package `nowhere` not found",
                "a.mid:3:8: A redeclared in this block\n\tprevious declaration at b.mid:2:8",
                "b.mid:3:16: array size `X` is not an integer constant",
            ]
        );
        assert!(compilation.has_errors());
    }

    #[test]
    fn warnings_alone_are_not_errors() {
        let compilation = compile(&[SourceInput::new(
            "a.mid",
            "package app\nconst S = \"x\"\nstruct A {\n  array<int32, S> V\n}\n",
        )]);
        assert_eq!(compilation.diagnostics.len(), 1);
        assert!(!compilation.has_errors());
    }

    #[test]
    fn unresolved_names_become_errors_on_request() {
        let compilation = compile(&[SourceInput::new(
            "a.mid",
            "package app\nstruct A {\n  Missing M\n}\n",
        )]);
        assert!(!compilation.has_errors());
        let errors: Vec<_> = compilation
            .unresolved_errors()
            .iter()
            .map(|d| compilation.render_diagnostic(d))
            .collect();
        assert_eq!(errors, ["a.mid:3:3: undefined: Missing"]);
    }

    #[test]
    fn empty_input_compiles_to_empty_ir() {
        let compilation = compile(&[]);
        assert!(compilation.ir.packages.is_empty());
        assert!(compilation.diagnostics.is_empty());
    }
}
