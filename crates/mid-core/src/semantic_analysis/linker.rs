// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Package linking.
//!
//! **DDD Context:** Semantic Analysis
//!
//! The parser resolves what it can inside one file. The linker groups parsed
//! files into packages, merges their file scopes into one package scope,
//! binds imports, and retries every identifier the parser left pending.
//! Files may arrive in any order; a struct may refer to a type declared in a
//! file parsed after it.

use std::collections::{BTreeMap, HashMap};

use ecow::EcoString;
use tracing::{debug, instrument};

use crate::ast::{File, Package};
use crate::source_analysis::{Diagnostic, FileSet, Pos, Span, unquote};

use super::{DeclRef, ObjKind, Object, ObjectId, ParsedFile, QualifiedRef, ScopeId, SymbolTable};

/// An identifier that no scope declares.
///
/// Not an error by itself: whether unresolved names fail a build is up to
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedIdent {
    pub package: EcoString,
    pub filename: EcoString,
    pub name: EcoString,
    pub pos: Pos,
}

/// The result of [`link`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkOutput {
    /// Packages by name.
    pub packages: BTreeMap<String, Package>,
    /// Identifiers left unresolved, by package, then file, then position.
    pub unresolved: Vec<UnresolvedIdent>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Returns the package id an import path refers to: its last `/` segment.
///
/// ```
/// use mid_core::semantic_analysis::import_id;
///
/// assert_eq!(import_id("\"github.com/acme/common\""), Some("common".to_string()));
/// assert_eq!(import_id("`base`"), Some("base".to_string()));
/// assert_eq!(import_id("\"bad"), None);
/// ```
#[must_use]
pub fn import_id(raw_path: &str) -> Option<String> {
    let path = unquote(raw_path)?;
    let id = path.rsplit('/').next().unwrap_or_default();
    (!id.is_empty()).then(|| id.to_string())
}

/// A package being assembled.
struct PackageBuilder {
    name: EcoString,
    scope: ScopeId,
    files: Vec<ParsedFile>,
}

/// How one file sees its imports.
#[derive(Default)]
struct FileImports {
    /// Local name to (package object, package scope).
    named: HashMap<EcoString, (ObjectId, ScopeId)>,
    /// Scopes of dot-imported packages, in import order.
    dot: Vec<ScopeId>,
}

/// Links parsed files into packages.
#[instrument(skip_all, fields(files = files.len()))]
pub fn link(files: Vec<ParsedFile>, symbols: &mut SymbolTable, fset: &FileSet) -> LinkOutput {
    let mut linker = Linker {
        symbols,
        fset,
        diagnostics: Vec::new(),
    };

    let mut builders: BTreeMap<String, PackageBuilder> = BTreeMap::new();
    for parsed in files {
        let name = parsed.file.name.name.clone();
        let builder = builders
            .entry(name.to_string())
            .or_insert_with(|| PackageBuilder {
                name,
                scope: linker.symbols.new_scope(None),
                files: Vec::new(),
            });
        builder.files.push(parsed);
    }

    for builder in builders.values() {
        for parsed in &builder.files {
            linker.merge_file_scope(parsed.file.scope, builder.scope);
        }
    }

    let scopes: HashMap<String, ScopeId> = builders
        .iter()
        .map(|(name, builder)| (name.clone(), builder.scope))
        .collect();

    let mut packages = BTreeMap::new();
    let mut unresolved = Vec::new();
    for (key, builder) in builders {
        let package = linker.link_package(builder, &scopes);
        for file in package.files.values() {
            unresolved.extend(file.unresolved.iter().map(|ident| UnresolvedIdent {
                package: package.name.clone(),
                filename: file.filename.clone(),
                name: ident.name.clone(),
                pos: ident.pos,
            }));
        }
        debug!(
            package = %package.name,
            files = package.files.len(),
            objects = linker.symbols.scope(package.scope).len(),
            imports = package.imports.len(),
            "linked package"
        );
        packages.insert(key, package);
    }

    LinkOutput {
        packages,
        unresolved,
        diagnostics: linker.diagnostics,
    }
}

struct Linker<'a> {
    symbols: &'a mut SymbolTable,
    fset: &'a FileSet,
    diagnostics: Vec<Diagnostic>,
}

impl Linker<'_> {
    /// Inserts the objects of a file scope into the package scope in
    /// declaration order.
    fn merge_file_scope(&mut self, file_scope: ScopeId, package_scope: ScopeId) {
        for object in self.symbols.objects_in(file_scope) {
            let Some(existing) = self.symbols.insert(package_scope, object) else {
                continue;
            };
            let object = self.symbols.object(object);
            let previous = self.symbols.object(existing).pos;
            let message = format!(
                "{} redeclared in this block\n\tprevious declaration at {}",
                object.name,
                self.fset.position(previous)
            );
            let end = object.pos.raw() + u32::try_from(object.name.len()).unwrap_or(0);
            self.diagnostics
                .push(Diagnostic::error(message, Span::new(object.pos.raw(), end)));
        }
    }

    fn link_package(
        &mut self,
        builder: PackageBuilder,
        scopes: &HashMap<String, ScopeId>,
    ) -> Package {
        let mut imports = BTreeMap::new();
        let mut files = BTreeMap::new();
        for parsed in builder.files {
            let ParsedFile {
                mut file,
                qualified,
            } = parsed;
            let file_imports = self.bind_imports(&mut file, &mut imports, scopes);
            self.resolve_pending(&mut file, builder.scope, &file_imports);
            self.resolve_qualified(&mut file, qualified, &file_imports);
            file.unresolved.sort_by_key(|ident| (ident.pos, ident.id));

            let filename = file.filename.to_string();
            if files.contains_key(&filename) {
                let span = Span::at(file.package);
                self.diagnostics.push(Diagnostic::error(
                    format!("file {filename} appears twice in package {}", builder.name),
                    span,
                ));
                continue;
            }
            files.insert(filename, file);
        }
        Package {
            name: builder.name,
            scope: builder.scope,
            imports,
            files,
        }
    }

    /// Creates package objects for the imports of `file`.
    fn bind_imports(
        &mut self,
        file: &mut File,
        imports: &mut BTreeMap<String, ObjectId>,
        scopes: &HashMap<String, ScopeId>,
    ) -> FileImports {
        let mut bound = FileImports::default();
        for spec in &file.imports {
            // malformed paths were reported by the parser
            let Some(id) = import_id(&spec.path.value) else {
                continue;
            };
            let Some(&scope) = scopes.get(&id) else {
                let end = spec.path.pos.raw() + u32::try_from(spec.path.value.len()).unwrap_or(0);
                self.diagnostics.push(Diagnostic::error(
                    format!("package `{id}` not found"),
                    Span::new(spec.path.pos.raw(), end),
                ));
                continue;
            };

            let object = *imports.entry(id.clone()).or_insert_with(|| {
                self.symbols.new_object(Object {
                    kind: ObjKind::Pkg,
                    name: EcoString::from(id.as_str()),
                    decl: DeclRef::Package(EcoString::from(id.as_str())),
                    pos: spec.begin(),
                    data: None,
                })
            });

            match &spec.name {
                Some(alias) if alias.name == "." => bound.dot.push(scope),
                Some(alias) if alias.is_blank() => {}
                Some(alias) => {
                    file.resolutions.set(alias.id, object);
                    bound.named.insert(alias.name.clone(), (object, scope));
                }
                None => {
                    bound.named.insert(EcoString::from(id.as_str()), (object, scope));
                }
            }
        }
        bound
    }

    /// Retries identifiers the parser could not resolve within their file.
    fn resolve_pending(&self, file: &mut File, package_scope: ScopeId, imports: &FileImports) {
        let pending = std::mem::take(&mut file.unresolved);
        for ident in pending {
            let object = self.symbols.lookup(package_scope, &ident.name).or_else(|| {
                imports
                    .dot
                    .iter()
                    .find_map(|&scope| self.symbols.lookup(scope, &ident.name))
            });
            match object {
                Some(object) => file.resolutions.set(ident.id, object),
                None => file.unresolved.push(ident),
            }
        }
    }

    /// Resolves `pkg.Name` references through the file's imports.
    fn resolve_qualified(
        &self,
        file: &mut File,
        qualified: Vec<QualifiedRef>,
        imports: &FileImports,
    ) {
        for QualifiedRef { package, name } in qualified {
            let Some(&(object, scope)) = imports.named.get(&package.name) else {
                file.unresolved.push(package);
                continue;
            };
            file.resolutions.set(package.id, object);
            match self.symbols.lookup(scope, &name.name) {
                Some(target) => file.resolutions.set(name.id, target),
                None => file.unresolved.push(name),
            }
        }
    }
}

/// Returns the identifiers of `file` that resolve, with the names of their
/// objects, in position order.
#[cfg(test)]
pub(crate) fn resolved_names(file: &File, symbols: &SymbolTable) -> Vec<(Pos, EcoString)> {
    let mut resolved = Vec::new();
    crate::ast_walker::inspect(crate::ast_walker::Node::File(file), |node| {
        if let crate::ast_walker::Node::Ident(ident) = node {
            if let Some(object) = file.resolutions.get(ident.id) {
                resolved.push((ident.pos, symbols.object(object).name.clone()));
            }
        }
        true
    });
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse_file;

    struct Linked {
        fset: FileSet,
        symbols: SymbolTable,
        output: LinkOutput,
        parse_diagnostics: Vec<Diagnostic>,
    }

    fn link_sources(sources: &[(&str, &str)]) -> Linked {
        let mut fset = FileSet::new();
        let mut symbols = SymbolTable::new();
        let mut parsed = Vec::new();
        let mut parse_diagnostics = Vec::new();
        for (name, source) in sources {
            let (file, diagnostics) = parse_file(&mut fset, &mut symbols, name, source).unwrap();
            parsed.push(file);
            parse_diagnostics.extend(diagnostics);
        }
        let output = link(parsed, &mut symbols, &fset);
        Linked {
            fset,
            symbols,
            output,
            parse_diagnostics,
        }
    }

    fn render(linked: &Linked) -> Vec<String> {
        linked
            .output
            .diagnostics
            .iter()
            .map(|d| format!("{}: {}", linked.fset.position(d.span.pos()), d.message))
            .collect()
    }

    #[test]
    fn cross_file_references_resolve() {
        let linked = link_sources(&[
            ("a.mid", "package p\nstruct A { B Other }"),
            ("b.mid", "package p\nstruct B { A Back }"),
        ]);
        assert!(linked.parse_diagnostics.is_empty());
        assert!(linked.output.diagnostics.is_empty());
        assert!(linked.output.unresolved.is_empty());
        let package = &linked.output.packages["p"];
        assert_eq!(package.files.len(), 2);
        assert_eq!(linked.symbols.scope(package.scope).len(), 2);
        let a = &package.files["a.mid"];
        assert!(a.unresolved.is_empty());
        let names: Vec<_> = resolved_names(a, &linked.symbols)
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert!(names.contains(&EcoString::from("B")));
    }

    #[test]
    fn redeclaration_across_files() {
        let linked = link_sources(&[
            ("a.mid", "package p\nstruct A {}"),
            ("b.mid", "package p\nconst A = 1"),
        ]);
        assert_eq!(
            render(&linked),
            ["b.mid:2:7: A redeclared in this block\n\tprevious declaration at a.mid:2:8"]
        );
    }

    #[test]
    fn unresolved_identifiers_are_reported_not_errors() {
        let linked = link_sources(&[("a.mid", "package p\nstruct A { Missing M }")]);
        assert!(linked.output.diagnostics.is_empty());
        assert_eq!(
            linked.output.unresolved,
            [UnresolvedIdent {
                package: "p".into(),
                filename: "a.mid".into(),
                name: "Missing".into(),
                pos: Pos::new(22),
            }]
        );
    }

    #[test]
    fn qualified_reference_through_import() {
        let linked = link_sources(&[
            ("app.mid", "package app\nimport \"lib/common\"\nstruct U { common.Address Home }"),
            ("common.mid", "package common\nstruct Address { string Street }"),
        ]);
        assert!(linked.output.diagnostics.is_empty(), "{:?}", render(&linked));
        assert!(linked.output.unresolved.is_empty());
        let app = &linked.output.packages["app"];
        assert_eq!(app.imports.len(), 1);
        let object = linked.symbols.object(app.imports["common"]);
        assert_eq!(object.kind, ObjKind::Pkg);
        assert_eq!(object.decl, DeclRef::Package("common".into()));

        let resolved = resolved_names(&app.files["app.mid"], &linked.symbols);
        let names: Vec<_> = resolved.iter().map(|(_, name)| name.as_str()).collect();
        assert!(names.contains(&"common"));
        assert!(names.contains(&"Address"));
    }

    #[test]
    fn aliased_and_dot_imports() {
        let linked = link_sources(&[
            (
                "app.mid",
                "package app\nimport (\n c \"common\"\n . \"shared\"\n)\nstruct U { c.Address Home\n Base B }",
            ),
            ("common.mid", "package common\nstruct Address {}"),
            ("shared.mid", "package shared\nprotocol Base {}"),
        ]);
        assert!(linked.output.diagnostics.is_empty(), "{:?}", render(&linked));
        assert!(linked.output.unresolved.is_empty(), "{:?}", linked.output.unresolved);
    }

    #[test]
    fn qualifier_must_match_local_name() {
        let linked = link_sources(&[
            ("app.mid", "package app\nimport c \"common\"\nstruct U { common.Address Home }"),
            ("common.mid", "package common\nstruct Address {}"),
        ]);
        let names: Vec<_> = linked
            .output
            .unresolved
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(names, ["common"]);
    }

    #[test]
    fn missing_package_is_an_error() {
        let linked = link_sources(&[("a.mid", "package p\nimport \"x/nowhere\"")]);
        assert_eq!(render(&linked), ["a.mid:2:8: package `nowhere` not found"]);
        assert!(linked.output.packages["p"].imports.is_empty());
    }

    #[test]
    fn packages_are_separate_namespaces() {
        let linked = link_sources(&[
            ("a.mid", "package a\nstruct S {}"),
            ("b.mid", "package b\nstruct S {}\nstruct T { S Inner }"),
        ]);
        assert!(linked.output.diagnostics.is_empty());
        assert_eq!(linked.output.packages.len(), 2);
        assert!(linked.output.unresolved.is_empty());
    }

    #[test]
    fn import_ids() {
        assert_eq!(import_id("\"a/b/c\"").as_deref(), Some("c"));
        assert_eq!(import_id("\"c\"").as_deref(), Some("c"));
        assert_eq!(import_id("\"a/\""), None);
    }
}
