// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error diagnostics using miette.
//!
//! Converts mid-core diagnostics into miette-formatted reports with the
//! offending source line and a label under the span.

// Suppress unused_assignments for struct fields used by derive macros
#![allow(unused_assignments)]

use mid_core::source_analysis::{Diagnostic as CoreDiagnostic, Severity, SourceFile};
use miette::{Diagnostic, SourceSpan};

/// A compilation diagnostic with rich formatting.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(mid::compile))]
pub struct CompileDiagnostic {
    pub severity: Severity,
    pub message: String,
    /// Source code for context
    #[source_code]
    pub src: miette::NamedSource<String>,
    #[label("{label}")]
    pub span: SourceSpan,
    /// Label for the span (interpolated by miette derive macro)
    pub label: String,
    #[help]
    pub hint: Option<String>,
}

impl CompileDiagnostic {
    /// Creates a diagnostic for a span inside `file`, whose text is `source`.
    pub fn from_core_diagnostic(diagnostic: &CoreDiagnostic, file: &SourceFile, source: &str) -> Self {
        let label = match diagnostic.severity {
            Severity::Error => "error here",
            Severity::Warning => "warning here",
        };
        let local = file.local_span(diagnostic.span);
        let offset = (local.start() as usize).min(source.len());
        let len = (local.len() as usize).min(source.len() - offset);

        Self {
            severity: diagnostic.severity,
            message: diagnostic.message.to_string(),
            src: miette::NamedSource::new(file.name(), source.to_string()),
            span: (offset, len).into(),
            label: label.to_string(),
            hint: diagnostic.hint.as_ref().map(ToString::to_string),
        }
    }
}
