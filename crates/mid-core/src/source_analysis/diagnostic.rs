// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Compiler diagnostics.
//!
//! Every stage of the pipeline reports problems as [`Diagnostic`] values
//! instead of failing. Spans are global, so a diagnostic resolves to a
//! [`Position`] through the [`FileSet`] of its compilation.

use ecow::EcoString;

use super::{FileSet, LexError, Position, Span};

/// A diagnostic message (error or warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The message.
    pub message: EcoString,
    /// The source location.
    pub span: Span,
    /// Optional hint for how to fix the issue.
    pub hint: Option<EcoString>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Attaches a hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Returns `true` for errors.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Resolves the start of the span.
    #[must_use]
    pub fn position(&self, fset: &FileSet) -> Position {
        fset.position(self.span.pos())
    }
}

impl From<LexError> for Diagnostic {
    fn from(error: LexError) -> Self {
        Self::error(error.kind.to_string(), error.span)
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// A problem that makes the output unusable.
    Error,
    /// A problem the builder worked around.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// Sorts diagnostics by file name, line and column.
///
/// The sort is stable, so diagnostics at the same position keep the order in
/// which they were reported.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic], fset: &FileSet) {
    diagnostics.sort_by_cached_key(|diagnostic| {
        let position = diagnostic.position(fset);
        (position.filename, position.line, position.column)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::LexErrorKind;

    #[test]
    fn constructors_set_severity() {
        let err = Diagnostic::error("bad", Span::new(1, 2));
        assert!(err.is_error());
        let warn = Diagnostic::warning("meh", Span::new(1, 2)).with_hint("try harder");
        assert!(!warn.is_error());
        assert_eq!(warn.hint.as_deref(), Some("try harder"));
    }

    #[test]
    fn lex_errors_convert() {
        let lex = LexError::new(LexErrorKind::UnterminatedString, Span::new(3, 9));
        let diagnostic = Diagnostic::from(lex);
        assert_eq!(diagnostic.message, "string literal not terminated");
        assert_eq!(diagnostic.span, Span::new(3, 9));
        assert!(diagnostic.is_error());
    }

    #[test]
    fn sorts_by_file_then_position() {
        let mut fset = FileSet::new();
        let b = fset.add_file("b.mid", None, 20).unwrap();
        let a = fset.add_file("a.mid", None, 20).unwrap();
        fset.file_mut(a).add_line(5);
        let at = |fset: &FileSet, id, offset| {
            let pos = fset.file(id).pos(offset).unwrap();
            Span::at(pos)
        };
        let mut diagnostics = vec![
            Diagnostic::error("b1", at(&fset, b, 0)),
            Diagnostic::error("a2", at(&fset, a, 7)),
            Diagnostic::error("a1", at(&fset, a, 2)),
        ];
        sort_diagnostics(&mut diagnostics, &fset);
        let order: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(order, ["a1", "a2", "b1"]);
    }
}
