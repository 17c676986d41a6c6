// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! File and declaration parsing.
//!
//! This module contains the file-level driver and the parsers for `import`
//! and `const` declarations and for bean bodies.

use ecow::EcoString;

use crate::ast::{
    BasicLit, BeanDecl, BeanKind, CommentGroup, ConstSpec, Decl, Expr, Field, FieldList, File,
    GenDecl, GenKind, Ident, ImportSpec, LitKind, Spec, StructType, Type,
};
use crate::semantic_analysis::{DeclRef, ObjKind, ParsedFile, ScopeId};
use crate::source_analysis::{Diagnostic, Pos, Span, TokenKind, unquote};

use super::Parser;

/// Characters that may not appear in an import path.
const INVALID_IMPORT_CHARS: &str = "!\"#$%&'()*,:;<=>?[\\]^{|}`\u{FFFD}";

impl Parser<'_> {
    // ========================================================================
    // File
    // ========================================================================

    /// Parses the whole file.
    pub(super) fn parse(mut self) -> (ParsedFile, Vec<Diagnostic>) {
        let doc = self.lead_comment.take();
        let package = self.expect(&TokenKind::Package);

        let explicit_blank = matches!(self.current_kind(), TokenKind::Ident(name) if name == "_");
        let name = self.parse_ident();
        if explicit_blank {
            self.error(ident_span(&name), "invalid package name _");
        }
        self.expect_semi();

        let mut decls = Vec::new();
        while self.check(&TokenKind::Import) {
            self.decl_index = decls.len();
            decls.push(Decl::Gen(self.parse_gen_decl(GenKind::Import)));
        }
        while !self.is_at_end() {
            self.decl_index = decls.len();
            decls.push(self.parse_decl());
        }

        // later declarations may have resolved earlier references
        let mut unresolved = Vec::new();
        for ident in std::mem::take(&mut self.pending) {
            match self.symbols.lookup(self.file_scope, &ident.name) {
                Some(object) => self.resolutions.set(ident.id, object),
                None => unresolved.push(ident),
            }
        }

        let file = File {
            id: self.file.id(),
            filename: EcoString::from(self.file.name()),
            doc,
            package,
            name,
            decls,
            scope: self.file_scope,
            imports: self.imports,
            unresolved,
            comments: self.comments,
            resolutions: self.resolutions,
        };
        let parsed = ParsedFile {
            file,
            qualified: self.qualified,
        };
        (parsed, self.diagnostics)
    }

    fn parse_decl(&mut self) -> Decl {
        match self.current_kind() {
            TokenKind::Const => Decl::Gen(self.parse_gen_decl(GenKind::Const)),
            TokenKind::Struct => Decl::Bean(self.parse_bean_decl(BeanKind::Struct)),
            TokenKind::Protocol => Decl::Bean(self.parse_bean_decl(BeanKind::Protocol)),
            TokenKind::Service => Decl::Bean(self.parse_bean_decl(BeanKind::Service)),
            TokenKind::Enum => Decl::Bean(self.parse_bean_decl(BeanKind::Enum)),
            _ => {
                let from = self.current_pos();
                self.error_expected("declaration");
                self.sync_decl();
                Decl::Bad {
                    from,
                    to: self.current_pos(),
                }
            }
        }
    }

    // ========================================================================
    // Import & Const
    // ========================================================================

    /// Parses `import` or `const`, with one spec or a parenthesised group.
    fn parse_gen_decl(&mut self, keyword: GenKind) -> GenDecl {
        let doc = self.lead_comment.take();
        let tok_pos = self.advance().span().pos();

        let mut specs = Vec::new();
        let mut previous = None;
        if self.check(&TokenKind::LeftParen) {
            let lparen = self.advance().span().pos();
            let mut iota = 0;
            while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
                let start = self.current;
                let doc = self.lead_comment.take();
                specs.push(self.parse_spec(keyword, doc, specs.len(), iota, &mut previous));
                iota += 1;
                if self.current == start {
                    self.advance();
                }
            }
            let rparen = self.expect(&TokenKind::RightParen);
            return GenDecl {
                doc,
                tok_pos,
                keyword,
                lparen,
                specs,
                rparen,
            };
        }

        specs.push(self.parse_spec(keyword, None, 0, 0, &mut previous));
        GenDecl {
            doc,
            tok_pos,
            keyword,
            lparen: Pos::NONE,
            specs,
            rparen: Pos::NONE,
        }
    }

    fn parse_spec(
        &mut self,
        keyword: GenKind,
        doc: Option<CommentGroup>,
        index: usize,
        iota: i64,
        previous: &mut Option<Expr>,
    ) -> Spec {
        match keyword {
            GenKind::Import => Spec::Import(self.parse_import_spec(doc)),
            GenKind::Const => Spec::Const(self.parse_const_spec(doc, index, iota, previous)),
        }
    }

    fn parse_import_spec(&mut self, doc: Option<CommentGroup>) -> ImportSpec {
        let name = match self.current_kind() {
            TokenKind::Period => {
                let pos = self.advance().span().pos();
                Some(self.new_ident(EcoString::from("."), pos))
            }
            TokenKind::Ident(_) => Some(self.parse_ident()),
            _ => None,
        };

        let path = if matches!(self.current_kind(), TokenKind::String(_)) {
            let span = self.current_token().span();
            let path = self.parse_basic_lit();
            if !is_valid_import_path(&path.value) {
                self.error(span, format!("invalid import path: {}", path.value));
            }
            path
        } else {
            let pos = self.expect(&TokenKind::String(EcoString::new()));
            BasicLit {
                pos,
                kind: LitKind::String,
                value: EcoString::new(),
            }
        };
        self.expect_semi();

        let spec = ImportSpec {
            doc,
            name,
            path,
            comment: self.line_comment.clone(),
        };
        self.imports.push(spec.clone());
        spec
    }

    fn parse_const_spec(
        &mut self,
        doc: Option<CommentGroup>,
        index: usize,
        iota: i64,
        previous: &mut Option<Expr>,
    ) -> ConstSpec {
        let name = self.parse_ident();
        let mut value = None;
        if self.check(&TokenKind::Assign) {
            self.advance();
            value = Some(self.parse_const_value());
        }
        self.expect_semi();
        let comment = self.line_comment.clone();

        if value.is_some() {
            previous.clone_from(&value);
        } else if iota == 0 {
            self.error(ident_span(&name), "missing constant value");
        } else {
            value = previous.clone();
        }

        let decl = DeclRef::Spec {
            file: self.file.id(),
            decl: self.decl_index,
            spec: index,
        };
        self.declare(&name, ObjKind::Const, decl, Some(iota), self.file_scope);
        ConstSpec {
            doc,
            name,
            value,
            comment,
        }
    }

    fn parse_const_value(&mut self) -> Expr {
        match self.current_kind() {
            TokenKind::Int(_) | TokenKind::Float(_) | TokenKind::String(_) => {
                Expr::Lit(self.parse_basic_lit())
            }
            TokenKind::Ident(_) => {
                let ident = self.parse_ident();
                self.resolve_ident(&ident);
                Expr::Ident(ident)
            }
            _ => {
                let pos = self.current_pos();
                self.error_expected("constant value");
                Expr::Bad { from: pos, to: pos }
            }
        }
    }

    // ========================================================================
    // Beans
    // ========================================================================

    fn parse_bean_decl(&mut self, kind: BeanKind) -> BeanDecl {
        let doc = self.lead_comment.take();
        let pos = self.advance().span().pos();
        let name = self.parse_ident();
        let tag = matches!(self.current_kind(), TokenKind::String(_))
            .then(|| self.parse_basic_lit());

        let scope = self.symbols.new_scope(Some(self.file_scope));
        let opening = self.expect(&TokenKind::LeftBrace);
        let mut list = Vec::new();
        loop {
            let start = self.current;
            let index = list.len();
            let field = match (kind, self.current_kind()) {
                (BeanKind::Service, TokenKind::Ident(_)) => self.parse_method_spec(scope, index),
                (BeanKind::Enum, TokenKind::Ident(_)) => self.parse_enum_spec(scope, index),
                (
                    BeanKind::Struct | BeanKind::Protocol,
                    TokenKind::Ident(_)
                    | TokenKind::Extends
                    | TokenKind::Required
                    | TokenKind::Optional,
                ) => self.parse_field_decl(scope, index),
                _ => break,
            };
            list.push(field);
            if self.current == start {
                self.advance();
            }
        }
        let closing = self.expect(&TokenKind::RightBrace);

        let decl = DeclRef::Decl {
            file: self.file.id(),
            decl: self.decl_index,
        };
        self.declare(&name, ObjKind::Bean, decl, None, self.file_scope);
        BeanDecl {
            kind,
            pos,
            doc,
            name,
            tag,
            fields: FieldList {
                opening,
                list,
                closing,
            },
        }
    }

    fn field_ref(&self, field: usize) -> DeclRef {
        DeclRef::Field {
            file: self.file.id(),
            decl: self.decl_index,
            field,
        }
    }

    /// Parses a struct or protocol member: `[required] Type A, B [tag]` or
    /// `extends Type`.
    fn parse_field_decl(&mut self, scope: ScopeId, index: usize) -> Field {
        let doc = self.lead_comment.take();
        let mut options = Vec::new();
        while self.check(&TokenKind::Required) || self.check(&TokenKind::Optional) {
            let token = self.advance();
            let option = self.new_ident(EcoString::from(token.kind().name()), token.span().pos());
            options.push(option);
        }

        let (ty, names) = if self.check(&TokenKind::Extends) {
            self.advance();
            (self.parse_type_name(), Vec::new())
        } else {
            let ty = self.parse_type_name();
            (ty, self.parse_ident_list())
        };
        let tag = matches!(self.current_kind(), TokenKind::String(_))
            .then(|| self.parse_basic_lit());
        self.expect_semi();
        let comment = self.line_comment.clone();

        for name in &names {
            let decl = self.field_ref(index);
            self.declare(name, ObjKind::Var, decl, None, scope);
        }
        self.resolve_type(&ty);
        Field {
            doc,
            options,
            ty: Some(ty),
            names,
            default: None,
            tag,
            comment,
        }
    }

    /// Parses a service member: `Name(Params) Result` or an extended protocol.
    fn parse_method_spec(&mut self, scope: ScopeId, index: usize) -> Field {
        let doc = self.lead_comment.take();
        let ty = self.parse_type_name();
        let (names, ty) = match method_name(&ty) {
            Some(name) if self.check(&TokenKind::LeftParen) => (vec![name], self.parse_signature()),
            _ => (Vec::new(), ty),
        };
        self.expect_semi();
        let comment = self.line_comment.clone();

        for name in &names {
            let decl = self.field_ref(index);
            self.declare(name, ObjKind::Fun, decl, None, scope);
        }
        self.resolve_type(&ty);
        Field {
            doc,
            options: Vec::new(),
            ty: Some(ty),
            names,
            default: None,
            tag: None,
            comment,
        }
    }

    /// Parses an enum member: `Name = 1,`.
    fn parse_enum_spec(&mut self, scope: ScopeId, index: usize) -> Field {
        let doc = self.lead_comment.take();
        let name = self.parse_ident();
        self.expect(&TokenKind::Assign);
        let value = match self.current_kind() {
            TokenKind::Int(_) => Expr::Lit(self.parse_basic_lit()),
            TokenKind::Ident(_) => Expr::Ident(self.parse_ident()),
            _ => {
                let pos = self.current_pos();
                self.error_expected("enum value");
                Expr::Bad { from: pos, to: pos }
            }
        };
        if self.check(&TokenKind::Comma) {
            self.advance();
        } else if !self.check(&TokenKind::RightBrace) {
            self.expect(&TokenKind::Comma);
        }
        let comment = self.line_comment.clone();

        let decl = self.field_ref(index);
        let ordinal = i64::try_from(index).ok();
        self.declare(&name, ObjKind::Const, decl, ordinal, scope);
        Field {
            doc,
            options: Vec::new(),
            ty: None,
            names: vec![name],
            default: Some(value),
            tag: None,
            comment,
        }
    }
}

/// The span covered by `ident`.
fn ident_span(ident: &Ident) -> Span {
    Span::new(ident.pos.raw(), ident.end().raw())
}

/// Returns the method name if `ty` is a plain name that can start a method.
fn method_name(ty: &Type) -> Option<Ident> {
    match ty {
        Type::Struct(StructType {
            package: None,
            name,
        })
        | Type::Basic { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// Checks that a quoted import path is non-empty and free of whitespace,
/// control and punctuation characters.
fn is_valid_import_path(raw: &str) -> bool {
    let Some(path) = unquote(raw) else {
        return false;
    };
    !path.is_empty()
        && path.chars().all(|c| {
            c.is_ascii_graphic() || (!c.is_ascii() && !c.is_whitespace() && !c.is_control())
        })
        && !path.chars().any(|c| INVALID_IMPORT_CHARS.contains(c))
}
