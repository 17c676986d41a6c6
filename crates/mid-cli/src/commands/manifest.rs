// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Project manifest parsing.
//!
//! **DDD Context:** Build System
//!
//! A project may carry a `mid.toml` at its root:
//!
//! ```toml
//! [project]
//! name = "shop"
//! source_dirs = ["schema"]
//! suffix = "mid"
//! output = "build/shop.ir.json"
//! strict = true
//! ```
//!
//! Every key but `name` is optional.

use camino::Utf8Path;
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;
use std::fs;

/// The file name looked for at the project root.
pub const MANIFEST_FILE: &str = "mid.toml";

/// The top-level manifest structure parsed from `mid.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub project: ProjectManifest,
}

/// The `[project]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    pub name: String,
    /// Directories searched for schema files, relative to the project root.
    #[serde(default = "default_source_dirs")]
    pub source_dirs: Vec<String>,
    /// Schema file extension, without the dot.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Where `mid build` writes the IR, relative to the project root.
    #[serde(default = "default_output")]
    pub output: String,
    /// Treat unresolved identifiers as errors.
    #[serde(default)]
    pub strict: bool,
}

impl ProjectManifest {
    /// The settings used when a project has no `mid.toml`.
    pub fn unnamed() -> Self {
        Self {
            name: String::new(),
            source_dirs: default_source_dirs(),
            suffix: default_suffix(),
            output: default_output(),
            strict: false,
        }
    }
}

fn default_source_dirs() -> Vec<String> {
    vec![".".to_string()]
}

fn default_suffix() -> String {
    "mid".to_string()
}

fn default_output() -> String {
    "mid.ir.json".to_string()
}

/// Parse a `mid.toml` manifest file.
pub fn parse_manifest(path: &Utf8Path) -> Result<ProjectManifest> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read manifest '{path}'"))?;

    let manifest: Manifest = toml::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse manifest '{path}'"))?;

    if manifest.project.suffix.is_empty() || manifest.project.suffix.contains('.') {
        miette::bail!(
            "Invalid suffix '{}' in '{path}': expected an extension without the dot",
            manifest.project.suffix
        );
    }
    Ok(manifest.project)
}

/// Look for `mid.toml` in the given directory and parse it if found.
///
/// Returns `None` if no manifest file exists. Returns an error if the file
/// exists but is malformed.
pub fn find_manifest(project_root: &Utf8Path) -> Result<Option<ProjectManifest>> {
    let manifest_path = project_root.join(MANIFEST_FILE);
    if manifest_path
        .try_exists()
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to stat manifest '{manifest_path}'"))?
    {
        parse_manifest(&manifest_path).map(Some)
    } else {
        Ok(None)
    }
}
