// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the midlang lexer.
//!
//! These tests use `proptest` to verify lexer invariants over generated inputs:
//!
//! 1. **Lexer never panics** - arbitrary string input always produces tokens
//! 2. **Token spans within input** - all token spans satisfy `end <= input.len()`
//! 3. **Token spans are non-overlapping** - token spans don't overlap
//! 4. **EOF is always last** - `lex_with_eof` always ends with EOF
//! 5. **Lexer is deterministic** - same input always produces same tokens
//! 6. **Valid fragments produce no errors** - known-valid inputs lex cleanly
//! 7. **Base offsets shift spans** - a base moves every span by exactly that much
//! 8. **Positions round-trip** - every offset of a lexed file, EOF included,
//!    resolves back to itself with the line and column counted from the text
//!
//! **DDD Context:** Source Analysis

use proptest::prelude::*;

use super::file_set::FileSet;
use super::lexer::{Lexer, lex, lex_file, lex_with_eof};
use super::literal::{quote, unquote};

// ============================================================================
// Generators
// ============================================================================

/// Known-valid single-token fragments that should lex without errors.
const VALID_SINGLE_TOKENS: &[&str] = &[
    "42",
    "0x2A",
    "052",
    "3.14",
    ".5",
    "1e9",
    "'a'",
    "'\\n'",
    "\"hello\"",
    "\"a\\tb\\u00e9\"",
    "`raw \\ string`",
    "User",
    "_",
    "int32",
    "package",
    "extends",
    "// line comment",
    "/* block */",
    "(",
    "}",
    "<",
    "=",
    ";",
];

/// Multi-token valid declarations that should lex cleanly.
const VALID_DECLARATIONS: &[&str] = &[
    "package demo",
    "import x \"a/b\"",
    "const ( A = 1; B )",
    "struct User `db:\"users\"` { string Name; int64 Id }",
    "enum Color { Red = 1, Green = 2 }",
    "service S { Get(int32 id) map<string, vector<User>> }",
    "struct A { array<byte, 16> Data /* nested /* ok */ */ }",
];

fn valid_single_token() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_SINGLE_TOKENS).prop_map(std::string::ToString::to_string)
}

fn valid_declaration() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_DECLARATIONS).prop_map(std::string::ToString::to_string)
}

/// Lexes `input` and returns how many errors were recorded.
fn error_count(input: &str) -> usize {
    let mut lexer = Lexer::new(input);
    let tokens: Vec<_> = lexer.by_ref().collect();
    let errors = lexer.take_errors().len();
    errors + tokens.iter().filter(|t| t.kind().is_error()).count()
}

// ============================================================================
// Property tests
// ============================================================================

/// Default is 512 cases; override via `PROPTEST_CASES` env var for nightly runs.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: Lexer never panics on arbitrary string input.
    #[test]
    fn lexer_never_panics(input in "\\PC{0,500}") {
        let _tokens = lex(&input);
    }

    /// Property 1b: Lexer never panics with lex_with_eof on arbitrary input.
    #[test]
    fn lexer_with_eof_never_panics(input in "\\PC{0,500}") {
        let _tokens = lex_with_eof(&input);
    }

    /// Property 2: All token spans are within input bounds.
    #[test]
    fn token_spans_within_input(input in "\\PC{0,500}") {
        let tokens = lex_with_eof(&input);
        let input_len = u32::try_from(input.len()).unwrap_or(u32::MAX);
        for token in &tokens {
            let span = token.span();
            prop_assert!(
                span.end() <= input_len,
                "Token {:?} span end {} exceeds input length {} for input {:?}",
                token.kind(),
                span.end(),
                input_len,
                input,
            );
            prop_assert!(
                span.start() <= span.end(),
                "Token {:?} span start {} > end {} for input {:?}",
                token.kind(),
                span.start(),
                span.end(),
                input,
            );
        }
    }

    /// Property 3: Token spans are non-overlapping and ordered.
    #[test]
    fn token_spans_non_overlapping(input in "\\PC{0,500}") {
        let tokens = lex(&input);
        for window in tokens.windows(2) {
            let prev = &window[0];
            let next = &window[1];
            prop_assert!(
                next.span().start() >= prev.span().end(),
                "Overlapping spans: {:?} at {:?} and {:?} at {:?} for input {:?}",
                prev.kind(),
                prev.span(),
                next.kind(),
                next.span(),
                input,
            );
        }
    }

    /// Property 4: lex_with_eof always ends with exactly one EOF.
    #[test]
    fn eof_always_last(input in "\\PC{0,500}") {
        let tokens = lex_with_eof(&input);
        let eofs = tokens.iter().filter(|t| t.kind().is_eof()).count();
        prop_assert_eq!(eofs, 1);
        prop_assert!(
            tokens.last().is_some_and(|t| t.kind().is_eof()),
            "Last token should be EOF for input {:?}",
            input,
        );
    }

    /// Property 5: Lexer is deterministic - same input, same tokens.
    #[test]
    fn lexer_deterministic(input in "\\PC{0,200}") {
        prop_assert_eq!(lex_with_eof(&input), lex_with_eof(&input));
    }

    /// Property 6: Known-valid single tokens lex to one token without errors.
    #[test]
    fn valid_tokens_no_errors(input in valid_single_token()) {
        prop_assert_eq!(lex(&input).len(), 1, "input {:?}", input);
        prop_assert_eq!(error_count(&input), 0, "input {:?}", input);
    }

    /// Property 7: Known-valid declarations produce no errors.
    #[test]
    fn valid_declarations_no_errors(input in valid_declaration()) {
        prop_assert_eq!(error_count(&input), 0, "input {:?}", input);
    }

    /// Property 8: A base shifts every span without changing the tokens.
    #[test]
    fn base_shifts_spans(input in "\\PC{0,200}", base in 1u32..1_000_000) {
        let plain = lex(&input);
        let shifted: Vec<_> = Lexer::with_base(&input, base).collect();
        prop_assert_eq!(plain.len(), shifted.len());
        for (a, b) in plain.iter().zip(&shifted) {
            prop_assert_eq!(a.kind(), b.kind());
            prop_assert_eq!(a.span().start() + base, b.span().start());
            prop_assert_eq!(a.span().end() + base, b.span().end());
        }
    }

    /// Property 8b: Positions resolve to the line and column counted from the
    /// text, for every offset up to and including EOF.
    #[test]
    fn positions_round_trip(input in "[\\PC\n]{0,200}") {
        let mut fset = FileSet::new();
        let id = fset.add_file("prop.mid", None, input.len()).unwrap();
        let _ = lex_file(fset.file_mut(id), &input);

        let bytes = input.as_bytes();
        for o in 0..=input.len() {
            let offset = u32::try_from(o).unwrap();
            let pos = fset.file(id).pos(offset).unwrap();
            let position = fset.position(pos);
            let newlines = bytes[..o].iter().filter(|&&b| b == b'\n').count();
            let line_start = bytes[..o].iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);

            prop_assert_eq!(position.filename.as_str(), "prop.mid");
            prop_assert_eq!(position.offset, offset);
            prop_assert_eq!(position.line as usize, newlines + 1, "offset {} of {:?}", o, input);
            prop_assert_eq!(position.column as usize, o - line_start + 1, "offset {} of {:?}", o, input);
        }
    }

    /// Property 9: Any string survives quoting and lexes as one clean literal.
    #[test]
    fn quoted_strings_lex_cleanly(text in "\\PC{0,50}") {
        let quoted = quote(&text);
        prop_assert_eq!(lex(&quoted).len(), 1, "quoted {:?}", quoted);
        prop_assert_eq!(error_count(&quoted), 0, "quoted {:?}", quoted);
        prop_assert_eq!(unquote(&quoted), Some(text));
    }
}
