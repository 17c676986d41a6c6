// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical error types.
//!
//! The lexer recovers from every error, so these are collected on the side
//! and turned into [`Diagnostic`](super::Diagnostic)s by the parser.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use super::Span;

/// A lexical error encountered during tokenization.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic()]
pub struct LexError {
    /// The kind of lexical error.
    #[source]
    pub kind: LexErrorKind,
    /// The source location of the error.
    #[label("here")]
    pub span: Span,
}

impl LexError {
    /// Creates a new lexical error.
    #[must_use]
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Creates an "unexpected character" error.
    #[must_use]
    pub fn unexpected_char(c: char, span: Span) -> Self {
        Self::new(LexErrorKind::UnexpectedCharacter(c), span)
    }

    /// Creates an "unterminated string" error.
    #[must_use]
    pub fn unterminated_string(span: Span) -> Self {
        Self::new(LexErrorKind::UnterminatedString, span)
    }

    /// Creates an "unterminated comment" error.
    #[must_use]
    pub fn unterminated_comment(span: Span) -> Self {
        Self::new(LexErrorKind::UnterminatedComment, span)
    }
}

/// The kind of lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("illegal character {0:?}")]
    UnexpectedCharacter(char),

    #[error("string literal not terminated")]
    UnterminatedString,

    #[error("comment not terminated")]
    UnterminatedComment,

    /// An unknown escape, or a malformed numeric escape.
    #[error("unknown escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// A numeric escape outside the valid range.
    #[error("escape sequence is invalid Unicode code point")]
    InvalidCodePoint,

    #[error("invalid number literal: {0}")]
    InvalidNumber(&'static str),

    /// An empty, overlong or unterminated character literal.
    #[error("invalid character literal")]
    InvalidCharacter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = LexError::unexpected_char('§', Span::new(0, 2));
        assert_eq!(err.to_string(), "illegal character '§'");

        let err = LexError::unterminated_string(Span::new(0, 10));
        assert_eq!(err.to_string(), "string literal not terminated");

        let err = LexError::new(
            LexErrorKind::InvalidNumber("hexadecimal literal has no digits"),
            Span::new(0, 2),
        );
        assert_eq!(
            err.to_string(),
            "invalid number literal: hexadecimal literal has no digits"
        );
    }

    #[test]
    fn lex_error_span() {
        let err = LexError::unterminated_comment(Span::new(5, 15));
        assert_eq!(err.span.start(), 5);
        assert_eq!(err.span.end(), 15);
    }
}
