// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the midlang parser.
//!
//! These tests use `proptest` to verify parser invariants over generated inputs:
//!
//! 1. **Parser never panics** - arbitrary string input always returns a file
//! 2. **Diagnostic spans within input** - all spans lie inside the file's range
//! 3. **Bad nodes produce diagnostics** - a `Bad` node implies an error
//! 4. **Error messages are user-facing** - no internal type names in diagnostics
//!
//! **DDD Context:** Source Analysis

use proptest::prelude::*;

use crate::ast::{Decl, Expr, Field, File, Spec, Type};
use crate::semantic_analysis::SymbolTable;
use crate::source_analysis::{Diagnostic, FileSet, parse_file};

// ============================================================================
// Near-valid midlang generators
// ============================================================================

/// Declaration fragments for composing near-valid inputs.
const FRAGMENTS: &[&str] = &[
    "struct User { string Name `json:\"name\"`; int64 Id }",
    "struct Derived { extends Base\n required vector<string> Tags }",
    "protocol Base { optional map<string, any> Extra }",
    "service Users { Get(int64 id) User\n List(int32, int32 limit) vector<User>\n Base }",
    "enum Color { Red = 1, Green = 2, Blue = 3 }",
    "const ( A = 1\n B\n C = \"s\" )",
    "const N = 16",
    "struct Buf { array<byte, N> Data }",
    "struct Ref { common.Address Home }",
    "// doc\nstruct Empty {}",
    "/* block */ enum E { X = 0 }",
];

/// Generates a source file from fragments.
fn valid_file() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..5).prop_map(|decls| {
        let mut source = String::from("package demo\nimport \"common\"\n");
        for decl in decls {
            source.push_str(decl);
            source.push('\n');
        }
        source
    })
}

/// Generates a file truncated at a random character.
fn truncated_file() -> impl Strategy<Value = String> {
    (valid_file(), any::<prop::sample::Index>()).prop_map(|(source, index)| {
        let chars: Vec<char> = source.chars().collect();
        let cut = index.index(chars.len() + 1);
        chars[..cut].iter().collect()
    })
}

/// Generates a file with brackets swapped.
fn mismatched_brackets() -> impl Strategy<Value = String> {
    valid_file().prop_map(|source| {
        source
            .chars()
            .map(|ch| match ch {
                '{' => '(',
                '}' => '>',
                '<' => '{',
                _ => ch,
            })
            .collect()
    })
}

/// Generates a file with a random character removed.
fn deleted_char() -> impl Strategy<Value = String> {
    (valid_file(), any::<prop::sample::Index>()).prop_map(|(source, index)| {
        let mut chars: Vec<char> = source.chars().collect();
        if !chars.is_empty() {
            chars.remove(index.index(chars.len()));
        }
        chars.into_iter().collect()
    })
}

/// Generates a near-valid midlang file using one of several mutation strategies.
fn near_valid_midlang() -> impl Strategy<Value = String> {
    prop_oneof![
        valid_file(),
        truncated_file(),
        mismatched_brackets(),
        deleted_char(),
    ]
}

// ============================================================================
// Helpers
// ============================================================================

fn parse(source: &str) -> (File, Vec<Diagnostic>) {
    let mut fset = FileSet::new();
    let mut symbols = SymbolTable::new();
    match parse_file(&mut fset, &mut symbols, "prop.mid", source) {
        Ok((parsed, diagnostics)) => (parsed.file, diagnostics),
        Err(err) => panic!("generated input cannot exceed the file set: {err}"),
    }
}

fn type_has_bad(ty: &Type) -> bool {
    match ty {
        Type::Bad { .. } => true,
        Type::Basic { .. } | Type::Struct(_) => false,
        Type::Array(array) => type_has_bad(&array.elem) || expr_has_bad(&array.size),
        Type::Vector(vector) => type_has_bad(&vector.elem),
        Type::Map(map) => type_has_bad(&map.key) || type_has_bad(&map.value),
        Type::Func(func) => {
            func.params.list.iter().any(field_has_bad) || func.result.as_ref().is_some_and(type_has_bad)
        }
    }
}

fn expr_has_bad(expr: &Expr) -> bool {
    match expr {
        Expr::Bad { .. } => true,
        Expr::Type(ty) => type_has_bad(ty),
        Expr::Ident(_) | Expr::Lit(_) => false,
    }
}

fn field_has_bad(field: &Field) -> bool {
    field.ty.as_ref().is_some_and(type_has_bad) || field.default.as_ref().is_some_and(expr_has_bad)
}

/// Checks if a file contains any `Bad` node.
fn file_has_bad_nodes(file: &File) -> bool {
    file.decls.iter().any(|decl| match decl {
        Decl::Bad { .. } => true,
        Decl::Gen(gen_decl) => gen_decl.specs.iter().any(|spec| match spec {
            Spec::Const(spec) => spec.value.as_ref().is_some_and(expr_has_bad),
            Spec::Import(_) => false,
        }),
        Decl::Bean(bean) => bean.fields.list.iter().any(field_has_bad),
    })
}

/// Internal type names that should never appear in user-facing diagnostics.
const INTERNAL_NAMES: &[&str] = &[
    "TokenKind",
    "unwrap()",
    "panic!",
    "unreachable!",
    "Type::",
    "Expr::",
    "Decl::",
    "internal error",
];

// ============================================================================
// Property tests
// ============================================================================

/// Default is 512 cases for standard CI; override via `PROPTEST_CASES` env var
/// for nightly extended runs (e.g., `PROPTEST_CASES=10000`).
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: Parser never panics on arbitrary string input.
    #[test]
    fn parser_never_panics(input in "\\PC{0,500}") {
        let (_file, _diagnostics) = parse(&input);
    }

    /// Property 1b: Parser never panics on near-valid structured input.
    #[test]
    fn parser_never_panics_near_valid(input in near_valid_midlang()) {
        let (_file, _diagnostics) = parse(&input);
    }

    /// Property 2: All diagnostic spans lie within the file.
    ///
    /// The file is the first in its set, so its positions run from 1 to
    /// `input.len() + 1`.
    #[test]
    fn diagnostic_spans_within_input(input in "\\PC{0,500}") {
        let (_file, diagnostics) = parse(&input);
        let end = u32::try_from(input.len()).unwrap_or(u32::MAX).saturating_add(1);
        for diag in &diagnostics {
            prop_assert!(
                diag.span.start() >= 1 && diag.span.end() <= end,
                "Diagnostic span {:?} outside 1..={} for input {:?}: {}",
                diag.span,
                end,
                input,
                diag.message,
            );
            prop_assert!(diag.span.start() <= diag.span.end());
        }
    }

    /// Property 3: Bad nodes always come with diagnostics.
    #[test]
    fn bad_nodes_produce_diagnostics(input in near_valid_midlang()) {
        let (file, diagnostics) = parse(&input);
        if file_has_bad_nodes(&file) {
            prop_assert!(
                diagnostics.iter().any(Diagnostic::is_error),
                "AST contains Bad node(s) but no errors for input: {:?}",
                input,
            );
        }
    }

    /// Property 4: Error messages are user-facing (no internal type names).
    #[test]
    fn error_messages_are_user_facing(input in near_valid_midlang()) {
        let (_file, diagnostics) = parse(&input);
        for diag in &diagnostics {
            for internal in INTERNAL_NAMES {
                prop_assert!(
                    !diag.message.contains(internal),
                    "Diagnostic message contains internal name {:?}: {:?} (input: {:?})",
                    internal,
                    diag.message,
                    input,
                );
            }
        }
    }

    /// Property 5: Parsing is deterministic.
    #[test]
    fn parsing_is_deterministic(input in near_valid_midlang()) {
        let (first, first_diagnostics) = parse(&input);
        let (second, second_diagnostics) = parse(&input);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first_diagnostics, second_diagnostics);
    }
}
