// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing infrastructure for midlang source code.
//!
//! **DDD Context:** Source Analysis
//!
//! This module contains position tracking, the lexer and the parser.
//!
//! # Positions
//!
//! A [`FileSet`] hands every registered file a disjoint range of global
//! [`Pos`] values and maps them back to file, line and column.
//!
//! ```
//! use mid_core::source_analysis::FileSet;
//!
//! let mut fset = FileSet::new();
//! let id = fset.add_file("a.mid", None, 12).unwrap();
//! fset.file_mut(id).add_line(6);
//! let pos = fset.file(id).pos(8).unwrap();
//! assert_eq!(fset.position(pos).to_string(), "a.mid:2:3");
//! ```
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s. Each token
//! carries its source location via [`Span`]. Comments are tokens too.
//!
//! ```
//! use mid_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("vector<User>").collect();
//! assert_eq!(tokens.len(), 4);
//! assert_eq!(tokens[1].kind(), &TokenKind::Less);
//! ```
//!
//! # Parsing
//!
//! [`parse_file`] turns one file into a [`File`](crate::ast::File), declaring
//! its names in a [`SymbolTable`](crate::semantic_analysis::SymbolTable).
//! See the [`parser`] module for the grammar.
//!
//! # Error Handling
//!
//! Neither stage stops at the first problem. The lexer emits
//! [`TokenKind::Error`] tokens and records [`LexError`]s; the parser inserts
//! `Bad` nodes. Both surface as [`Diagnostic`]s.

mod builtin;
mod diagnostic;
mod error;
mod file_set;
mod lexer;
mod literal;
pub mod parser;
mod span;
mod token;

// Property-based tests for the lexer
#[cfg(test)]
mod lexer_property_tests;

pub use builtin::BuiltinType;
pub use diagnostic::{Diagnostic, Severity, sort_diagnostics};
pub use error::{LexError, LexErrorKind};
pub use file_set::{FileId, FileSet, FileSetError, Position, SourceFile};
pub use lexer::{Lexer, lex, lex_file, lex_with_eof};
pub use literal::{quote, unquote};
pub use parser::parse_file;
pub use span::{Pos, Span};
pub use token::{Token, TokenKind};
