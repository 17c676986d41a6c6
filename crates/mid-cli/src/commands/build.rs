// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Build and check mid projects.

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use mid_core::compiler::{Compilation, SourceInput, compile};
use mid_core::source_analysis::{Diagnostic, sort_diagnostics};
use std::collections::HashMap;
use std::fs;
use tracing::{debug, info, instrument};

use super::manifest::{self, ProjectManifest};
use crate::diagnostic::CompileDiagnostic;

/// A project located on disk, ready to compile.
#[derive(Debug)]
struct Project {
    root: Utf8PathBuf,
    manifest: ProjectManifest,
    /// Source files, named relative to `root`, in sorted order.
    sources: Vec<SourceInput>,
}

/// Compile a project and write its IR.
#[instrument(skip_all, fields(path = %path))]
pub fn build(path: &str, out: Option<&str>, strict: bool) -> Result<()> {
    let project = load_project(Utf8Path::new(path))?;
    let compilation = compile_project(&project, strict)?;

    let output = match out {
        Some(out) => Utf8PathBuf::from(out),
        None => project.root.join(&project.manifest.output),
    };
    let json = compilation
        .ir
        .encode()
        .into_diagnostic()
        .wrap_err("Failed to encode IR")?;
    if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to create '{parent}'"))?;
    }
    fs::write(&output, json)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write '{output}'"))?;
    info!(output = %output, "Wrote IR");
    Ok(())
}

/// Compile a project and report problems without writing anything.
#[instrument(skip_all, fields(path = %path))]
pub fn check(path: &str, strict: bool) -> Result<()> {
    let project = load_project(Utf8Path::new(path))?;
    compile_project(&project, strict)?;
    Ok(())
}

/// Compiles `project`, printing every diagnostic. Fails if any is an error.
fn compile_project(project: &Project, strict: bool) -> Result<Compilation> {
    let compilation = compile(&project.sources);
    let diagnostics = collect_diagnostics(&compilation, strict || project.manifest.strict);

    let sources: HashMap<&str, &str> = project
        .sources
        .iter()
        .map(|source| (source.name.as_str(), source.content.as_str()))
        .collect();
    for diagnostic in &diagnostics {
        eprintln!("{:?}", report(&compilation, &sources, diagnostic));
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        miette::bail!("{errors} error(s) in {} file(s)", project.sources.len());
    }
    Ok(compilation)
}

/// Every diagnostic to report, in (filename, line, column) order.
///
/// In strict mode unresolved identifiers are errors too.
fn collect_diagnostics(compilation: &Compilation, strict: bool) -> Vec<Diagnostic> {
    let mut diagnostics = compilation.diagnostics.clone();
    if strict {
        diagnostics.extend(compilation.unresolved_errors());
        sort_diagnostics(&mut diagnostics, &compilation.file_set);
    }
    diagnostics
}

/// Renders a core diagnostic with its source, when the file is known.
fn report(
    compilation: &Compilation,
    sources: &HashMap<&str, &str>,
    diagnostic: &Diagnostic,
) -> miette::Report {
    let file = compilation.file_set.file_at(diagnostic.span.pos());
    let source = file.and_then(|file| sources.get(file.name()));
    match (file, source) {
        (Some(file), Some(source)) => {
            miette::Report::new(CompileDiagnostic::from_core_diagnostic(diagnostic, file, source))
        }
        _ => miette::miette!("{}", compilation.render_diagnostic(diagnostic)),
    }
}

/// Locates the project for `path` and reads its sources.
///
/// A directory is a project root; a single file is compiled on its own
/// with its directory as the root.
fn load_project(path: &Utf8Path) -> Result<Project> {
    let (root, single) = if path.is_dir() {
        (path.to_path_buf(), None)
    } else if path.is_file() {
        let root = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_path_buf);
        (root, Some(path.to_path_buf()))
    } else {
        miette::bail!("Path '{path}' does not exist");
    };

    let manifest = match manifest::find_manifest(&root)? {
        Some(manifest) => {
            info!(name = %manifest.name, "Found project manifest");
            manifest
        }
        None => {
            debug!("No mid.toml found, using defaults");
            ProjectManifest::unnamed()
        }
    };

    let files = match single {
        Some(file) => vec![file],
        None => find_source_files(&root, &manifest)?,
    };
    if files.is_empty() {
        miette::bail!("No .{} source files found in '{root}'", manifest.suffix);
    }
    info!(count = files.len(), "Found source files");

    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let content = fs::read_to_string(&file)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read '{file}'"))?;
        let name = file
            .strip_prefix(&root)
            .map_or_else(|_| file.to_string(), ToString::to_string);
        sources.push(SourceInput::new(name, content));
    }
    Ok(Project {
        root,
        manifest,
        sources,
    })
}

/// Collects the schema files under each source directory, sorted.
fn find_source_files(root: &Utf8Path, manifest: &ProjectManifest) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for dir in &manifest.source_dirs {
        let dir = root.join(dir);
        collect_source_files_recursive(&dir, &manifest.suffix, &mut files)
            .wrap_err_with(|| format!("Failed to search source directory '{dir}'"))?;
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Recursively collect all files ending in `.{suffix}` from a directory tree.
///
/// Symlinks are skipped to avoid potential infinite recursion from circular links.
fn collect_source_files_recursive(
    dir: &Utf8Path,
    suffix: &str,
    files: &mut Vec<Utf8PathBuf>,
) -> Result<()> {
    for entry in fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read directory '{dir}'"))?
    {
        let entry = entry.into_diagnostic()?;
        let file_type = entry.file_type().into_diagnostic()?;
        if file_type.is_symlink() {
            continue;
        }
        let entry_path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|_| miette::miette!("Non-UTF-8 path"))?;

        if file_type.is_dir() {
            collect_source_files_recursive(&entry_path, suffix, files)?;
        } else if file_type.is_file() && entry_path.extension() == Some(suffix) {
            files.push(entry_path);
        }
    }
    Ok(())
}
