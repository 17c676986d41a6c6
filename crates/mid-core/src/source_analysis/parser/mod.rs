// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for midlang source code.
//!
//! The parser builds a [`File`](crate::ast::File) from one source file,
//! declaring every top-level name and bean member as it goes and resolving
//! the identifiers it can within the file.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** - Parser MUST always produce an AST
//! - **Multiple errors** - Report all errors, don't stop at first
//! - **Synchronization points** - Recover at declaration keywords
//! - **Comments are attached, not discarded** - Each token advance groups
//!   the comments it skips into doc and line comments
//!
//! # Grammar
//!
//! ```text
//! File        := "package" Ident [";"] ImportDecl* TopDecl* EOF
//! ImportDecl  := "import" ( ImportSpec | "(" ImportSpec* ")" )
//! ImportSpec  := [ "." | Ident ] STRING [";"]
//! TopDecl     := ConstDecl | BeanDecl
//! ConstDecl   := "const" ( ConstSpec | "(" ConstSpec* ")" )
//! ConstSpec   := Ident [ "=" ( INT | FLOAT | STRING | Ident ) ] [";"]
//! BeanDecl    := ("struct"|"protocol"|"service"|"enum") Ident [STRING] "{" Body "}"
//! FieldDecl   := Option* ( "extends" TypeName | TypeName IdentList ) [STRING] [";"]
//! MethodSpec  := TypeName "(" ParamList ")" [TypeName] [";"] | TypeName [";"]
//! EnumSpec    := Ident "=" ( INT | Ident ) [","]
//! TypeName    := Ident "." Ident | "map" "<" TypeName "," TypeName ">"
//!              | "array" "<" TypeName "," ( INT | Ident ) ">"
//!              | "vector" "<" TypeName ">" | Ident
//! ```
//!
//! # Usage
//!
//! ```
//! use mid_core::semantic_analysis::SymbolTable;
//! use mid_core::source_analysis::{FileSet, parse_file};
//!
//! let mut fset = FileSet::new();
//! let mut symbols = SymbolTable::new();
//! let (parsed, diagnostics) =
//!     parse_file(&mut fset, &mut symbols, "user.mid", "package demo\nstruct User { string Name }")
//!         .unwrap();
//!
//! assert!(diagnostics.is_empty());
//! assert_eq!(parsed.file.name.name, "demo");
//! assert_eq!(parsed.file.decls.len(), 1);
//! ```

use ecow::EcoString;
use tracing::{debug, instrument};

use crate::ast::{
    Comment, CommentGroup, Expr, Ident, IdentId, ImportSpec, Resolutions, StructType, Type,
};
use crate::semantic_analysis::{
    DeclRef, ObjKind, Object, ParsedFile, QualifiedRef, ScopeId, SymbolTable,
};
use crate::source_analysis::{
    Diagnostic, FileSet, FileSetError, Pos, SourceFile, Span, Token, TokenKind, lex_file,
};

// Submodules with additional impl blocks for Parser
mod declarations;
mod types;

// Property-based tests
#[cfg(test)]
mod property_tests;

/// Maximum nesting depth for type expressions before the parser bails out.
///
/// Prevents stack overflow on input like `vector<vector<vector<...>>>`.
const MAX_NESTING_DEPTH: usize = 64;

/// How many times declaration sync may stop at the same position before it
/// is forced past it.
const MAX_SYNC_STOPS: usize = 10;

/// Parses one source file.
///
/// Registers the file with `fset`, lexes it (recording its lines), and
/// parses it, declaring objects in `symbols`. Lexical errors come first in
/// the returned diagnostics, followed by syntax and declaration errors.
///
/// # Errors
///
/// Fails only if the file cannot be registered, i.e. the set would exceed
/// 4GB of positions.
#[instrument(skip_all, fields(file = %filename))]
pub fn parse_file(
    fset: &mut FileSet,
    symbols: &mut SymbolTable,
    filename: &str,
    source: &str,
) -> Result<(ParsedFile, Vec<Diagnostic>), FileSetError> {
    let id = fset.add_file(filename, None, source.len())?;
    let (tokens, lex_errors) = lex_file(fset.file_mut(id), source);
    let mut diagnostics: Vec<Diagnostic> = lex_errors.into_iter().map(Diagnostic::from).collect();

    let parser = Parser::new(fset.file(id), symbols, tokens);
    let (parsed, parse_diagnostics) = parser.parse();
    diagnostics.extend(parse_diagnostics);

    debug!(
        package = %parsed.file.name.name,
        decls = parsed.file.decls.len(),
        unresolved = parsed.file.unresolved.len(),
        diagnostics = diagnostics.len(),
        "parsed file"
    );
    Ok((parsed, diagnostics))
}

/// The parser state.
pub(super) struct Parser<'a> {
    /// The file being parsed, with its lines already registered.
    file: &'a SourceFile,
    /// Where scopes and objects are allocated.
    symbols: &'a mut SymbolTable,
    /// The tokens being parsed, ending with EOF.
    tokens: Vec<Token>,
    /// Current token index. Never points at a comment or error token.
    current: usize,
    /// Accumulated diagnostics.
    diagnostics: Vec<Diagnostic>,
    /// Every comment group seen so far.
    comments: Vec<CommentGroup>,
    /// The comment group directly above the current token.
    lead_comment: Option<CommentGroup>,
    /// The comment group trailing the previous token on its line.
    line_comment: Option<CommentGroup>,
    /// Last position declaration sync stopped at.
    sync_pos: Pos,
    /// How many times sync stopped at `sync_pos`.
    sync_count: usize,
    /// Current type nesting depth.
    nesting_depth: usize,
    /// The scope top-level names are declared in.
    file_scope: ScopeId,
    /// Index of the declaration being parsed, for [`DeclRef`]s.
    decl_index: usize,
    /// Import specs seen so far.
    imports: Vec<ImportSpec>,
    /// Identifiers not yet resolved.
    pending: Vec<Ident>,
    /// `pkg.Name` references, left for the linker.
    qualified: Vec<QualifiedRef>,
    resolutions: Resolutions,
    next_ident: u32,
}

impl<'a> Parser<'a> {
    /// Creates a new parser and moves to the first token.
    fn new(file: &'a SourceFile, symbols: &'a mut SymbolTable, mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.kind().is_eof()) {
            let end = file.pos(file.size()).unwrap_or(Pos::NONE);
            tokens.push(Token::new(TokenKind::Eof, Span::at(end)));
        }
        let file_scope = symbols.new_scope(None);
        let mut parser = Self {
            file,
            symbols,
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            comments: Vec::new(),
            lead_comment: None,
            line_comment: None,
            sync_pos: Pos::NONE,
            sync_count: 0,
            nesting_depth: 0,
            file_scope,
            decl_index: 0,
            imports: Vec::new(),
            pending: Vec::new(),
            qualified: Vec::new(),
            resolutions: Resolutions::default(),
            next_ident: 0,
        };
        parser.skip_error_tokens();
        // no previous token: line 0 never matches a real line
        parser.collect_comments(0);
        parser
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token.
    pub(super) fn current_token(&self) -> &Token {
        let index = self.current.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> &TokenKind {
        self.current_token().kind()
    }

    /// Returns the position of the current token.
    pub(super) fn current_pos(&self) -> Pos {
        self.current_token().span().pos()
    }

    /// Returns the kind of the `n`th significant token after the current
    /// one, skipping comments and error tokens.
    pub(super) fn peek_kind(&self, n: usize) -> &TokenKind {
        self.tokens[self.current + 1..]
            .iter()
            .map(Token::kind)
            .filter(|kind| !kind.is_comment() && !kind.is_error())
            .nth(n.saturating_sub(1))
            .unwrap_or(&TokenKind::Eof)
    }

    /// Checks if we're at the end of input.
    pub(super) fn is_at_end(&self) -> bool {
        self.current_kind().is_eof()
    }

    /// Checks if the current token matches the given kind.
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Returns the line of `pos`, or 0 if it is not in this file.
    fn line_of(&self, pos: Pos) -> u32 {
        self.file.line(pos)
    }

    /// Advances to the next significant token and returns the previous one.
    ///
    /// Comments skipped on the way are grouped. A group that starts on the
    /// line of the previous token and ends before the next token's line
    /// becomes the line comment. The last group becomes the lead comment if
    /// the next token is on the line right after it.
    pub(super) fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        let prev_line = self.line_of(token.span().pos());
        self.next_raw();
        self.collect_comments(prev_line);
        token
    }

    /// Moves one token forward, stopping on comments but not on error tokens.
    fn next_raw(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.skip_error_tokens();
    }

    /// Error tokens were already reported by the lexer.
    fn skip_error_tokens(&mut self) {
        while self.current + 1 < self.tokens.len() && self.current_kind().is_error() {
            self.current += 1;
        }
    }

    fn collect_comments(&mut self, prev_line: u32) {
        self.lead_comment = None;
        self.line_comment = None;
        if !self.current_kind().is_comment() {
            return;
        }

        if self.line_of(self.current_pos()) == prev_line {
            // same line as the previous token: a line comment at most
            let (group, endline) = self.consume_comment_group(0);
            if self.line_of(self.current_pos()) != endline || self.is_at_end() {
                self.line_comment = Some(group);
            }
        }

        let mut last = None;
        let mut endline: i64 = -1;
        while self.current_kind().is_comment() {
            let (group, end) = self.consume_comment_group(1);
            last = Some(group);
            endline = i64::from(end);
        }
        if endline + 1 == i64::from(self.line_of(self.current_pos())) {
            self.lead_comment = last;
        }
    }

    /// Consumes comments at most `n` lines apart.
    fn consume_comment_group(&mut self, n: u32) -> (CommentGroup, u32) {
        let mut list = Vec::new();
        let mut endline = self.line_of(self.current_pos());
        while self.current_kind().is_comment() && self.line_of(self.current_pos()) <= endline + n {
            let (comment, end) = self.consume_comment();
            list.push(comment);
            endline = end;
        }
        let group = CommentGroup { list };
        self.comments.push(group.clone());
        (group, endline)
    }

    fn consume_comment(&mut self) -> (Comment, u32) {
        let token = self.current_token();
        let slash = token.span().pos();
        let text = token.kind().as_str().map(EcoString::from).unwrap_or_default();
        let mut endline = self.line_of(slash);
        if text.starts_with("/*") {
            let newlines = text.bytes().filter(|&b| b == b'\n').count();
            endline += u32::try_from(newlines).unwrap_or(0);
        }
        self.next_raw();
        (Comment { slash, text }, endline)
    }

    /// Expects the current token to match `kind`, advancing if it does.
    ///
    /// On a mismatch an error is reported and nothing is consumed. Returns
    /// the position of the current token either way.
    pub(super) fn expect(&mut self, kind: &TokenKind) -> Pos {
        let pos = self.current_pos();
        if self.check(kind) {
            self.advance();
        } else {
            let what = if kind.is_operator() {
                kind.name().to_string()
            } else {
                format!("'{}'", kind.name())
            };
            self.error_expected(&what);
        }
        pos
    }

    /// Consumes an optional `;`.
    ///
    /// A `,` in its place is consumed with an error.
    pub(super) fn expect_semi(&mut self) {
        match self.current_kind() {
            TokenKind::RightParen | TokenKind::RightBrace => {}
            TokenKind::Comma => {
                self.error_expected("';'");
                self.advance();
            }
            TokenKind::Semicolon => {
                self.advance();
            }
            _ => {}
        }
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    pub(super) fn new_ident(&mut self, name: EcoString, pos: Pos) -> Ident {
        let id = IdentId(self.next_ident);
        self.next_ident += 1;
        Ident { id, name, pos }
    }

    /// Parses an identifier. On a mismatch reports an error and returns `_`
    /// without consuming anything.
    pub(super) fn parse_ident(&mut self) -> Ident {
        let pos = self.current_pos();
        if let TokenKind::Ident(name) = self.current_kind() {
            let name = name.clone();
            self.advance();
            return self.new_ident(name, pos);
        }
        self.expect(&TokenKind::Ident(EcoString::new()));
        self.new_ident(EcoString::from("_"), pos)
    }

    /// Parses `Ident ("," Ident)*`.
    pub(super) fn parse_ident_list(&mut self) -> Vec<Ident> {
        let mut list = vec![self.parse_ident()];
        while self.check(&TokenKind::Comma) {
            self.advance();
            list.push(self.parse_ident());
        }
        list
    }

    // ========================================================================
    // Scopes & Resolution
    // ========================================================================

    /// Declares `ident` in `scope`.
    ///
    /// The blank identifier gets an object but is never inserted.
    pub(super) fn declare(
        &mut self,
        ident: &Ident,
        kind: ObjKind,
        decl: DeclRef,
        data: Option<i64>,
        scope: ScopeId,
    ) {
        let mut object = Object::new(kind, ident, decl);
        object.data = data;
        let id = self.symbols.new_object(object);
        self.resolutions.set(ident.id, id);
        if ident.is_blank() {
            return;
        }
        if let Some(existing) = self.symbols.insert(scope, id) {
            let prev = self.symbols.object(existing).begin();
            let mut message = format!("{} redeclared in this block", ident.name);
            if prev.is_valid() {
                message.push_str(&format!(
                    "\n\tprevious declaration at {}",
                    self.file.position(prev)
                ));
            }
            self.error(Span::new(ident.pos.raw(), ident.end().raw()), message);
        }
    }

    /// Resolves `ident` against the file scope, or queues it as pending.
    pub(super) fn resolve_ident(&mut self, ident: &Ident) {
        if ident.is_blank() {
            return;
        }
        match self.symbols.resolve(self.file_scope, &ident.name) {
            Some(object) => self.resolutions.set(ident.id, object),
            None => self.pending.push(ident.clone()),
        }
    }

    /// Resolves every name a type refers to.
    pub(super) fn resolve_type(&mut self, ty: &Type) {
        match ty {
            Type::Bad { .. } | Type::Basic { .. } => {}
            Type::Struct(StructType {
                package: Some(package),
                name,
            }) => self.qualified.push(QualifiedRef {
                package: package.clone(),
                name: name.clone(),
            }),
            Type::Struct(StructType {
                package: None,
                name,
            }) => self.resolve_ident(name),
            Type::Array(array) => {
                self.resolve_type(&array.elem);
                if let Expr::Ident(size) = &array.size {
                    self.resolve_ident(size);
                }
            }
            Type::Vector(vector) => self.resolve_type(&vector.elem),
            Type::Map(map) => {
                self.resolve_type(&map.key);
                self.resolve_type(&map.value);
            }
            Type::Func(func) => {
                for param in &func.params.list {
                    if let Some(ty) = &param.ty {
                        self.resolve_type(ty);
                    }
                }
                if let Some(result) = &func.result {
                    self.resolve_type(result);
                }
            }
        }
    }

    // ========================================================================
    // Error Handling & Recovery
    // ========================================================================

    pub(super) fn error(&mut self, span: Span, message: impl Into<EcoString>) {
        self.diagnostics.push(Diagnostic::error(message, span));
    }

    /// Reports `expected WHAT, found 'TOKEN'` at the current token.
    pub(super) fn error_expected(&mut self, what: &str) {
        let token = self.current_token();
        let kind = token.kind();
        let found = if kind.is_literal() || kind.is_eof() {
            kind.name().to_string()
        } else {
            kind.to_string()
        };
        let mut message = format!("expected {what}, found '{found}'");
        if let (true, Some(lit)) = (kind.is_literal(), kind.as_str()) {
            message.push(' ');
            message.push_str(lit);
        }
        let span = token.span();
        self.error(span, message);
    }

    /// Skips to the next declaration keyword or EOF.
    ///
    /// Stops at most [`MAX_SYNC_STOPS`] times at the same position, then
    /// forces progress past it.
    pub(super) fn sync_decl(&mut self) {
        loop {
            match self.current_kind() {
                TokenKind::Const
                | TokenKind::Protocol
                | TokenKind::Struct
                | TokenKind::Service
                | TokenKind::Enum => {
                    let pos = self.current_pos();
                    if pos == self.sync_pos && self.sync_count < MAX_SYNC_STOPS {
                        self.sync_count += 1;
                        return;
                    }
                    if pos > self.sync_pos {
                        self.sync_pos = pos;
                        self.sync_count = 0;
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
        }
    }
}
