// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for pipeline crash safety testing.
//!
//! Arbitrary input is split into up to three files at NUL bytes and run
//! through the whole pipeline: parse, link and build. The pipeline must
//! never panic, and every diagnostic must resolve to a position inside one
//! of the files.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mid_core::compiler::{SourceInput, compile};

fuzz_target!(|data: &[u8]| {
    // Sources are UTF-8 by the time they reach the compiler
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let sources: Vec<SourceInput> = text
        .splitn(3, '\0')
        .enumerate()
        .map(|(i, content)| SourceInput::new(format!("f{i}.mid"), content))
        .collect();

    let compilation = compile(&sources);
    for diagnostic in &compilation.diagnostics {
        let position = diagnostic.position(&compilation.file_set);
        assert!(position.is_valid(), "{}", diagnostic.message);
    }
    let _ = compilation.ir.encode();
});
