// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for midlang lexical analysis.
//!
//! Each token is a [`TokenKind`] plus the [`Span`] it covers. Literal tokens
//! carry their raw source text: string literals keep their quotes or
//! backticks, so the parser can hand them to
//! [`unquote`](super::unquote) unchanged.
//!
//! Comments are real tokens rather than trivia. The parser groups them into
//! doc and line comments as it goes.

use ecow::EcoString;

use super::Span;

/// The kind of token, not including source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Special ===
    /// End of file
    Eof,

    /// A complete comment, markers included: `// x` or `/* x */`
    Comment(EcoString),

    /// Invalid input; the lexer has already recorded an error for it
    Error(EcoString),

    // === Literals ===
    /// An identifier: `User`, `int32`, `_`
    Ident(EcoString),

    /// An integer literal: `42`, `0x2A`, `052`
    Int(EcoString),

    /// A floating-point literal: `3.14`, `.5`, `1e9`
    Float(EcoString),

    /// A character literal, quotes included: `'a'`
    Char(EcoString),

    /// A string literal, delimiters included: `"a\tb"` or `` `raw` ``
    String(EcoString),

    // === Operators ===
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `,`
    Comma,
    /// `.`
    Period,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `=`
    Assign,
    /// `@`
    At,
    /// `$`
    Dollar,
    /// `#`
    Hash,

    // === Keywords ===
    /// `package`
    Package,
    /// `import`
    Import,
    /// `enum`
    Enum,
    /// `const`
    Const,
    /// `struct`
    Struct,
    /// `protocol`
    Protocol,
    /// `service`
    Service,
    /// `required`
    Required,
    /// `optional`
    Optional,
    /// `extends`
    Extends,
}

impl TokenKind {
    /// Maps an identifier to its keyword token, if it is one.
    ///
    /// ```
    /// use mid_core::source_analysis::TokenKind;
    ///
    /// assert_eq!(TokenKind::keyword("struct"), Some(TokenKind::Struct));
    /// assert_eq!(TokenKind::keyword("int32"), None);
    /// ```
    #[must_use]
    pub fn keyword(ident: &str) -> Option<Self> {
        let kind = match ident {
            "package" => Self::Package,
            "import" => Self::Import,
            "enum" => Self::Enum,
            "const" => Self::Const,
            "struct" => Self::Struct,
            "protocol" => Self::Protocol,
            "service" => Self::Service,
            "required" => Self::Required,
            "optional" => Self::Optional,
            "extends" => Self::Extends,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the category name used in diagnostics: `IDENT`, `'{'`,
    /// `struct` and so on.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Comment(_) => "COMMENT",
            Self::Error(_) => "ILLEGAL",
            Self::Ident(_) => "IDENT",
            Self::Int(_) => "INT",
            Self::Float(_) => "FLOAT",
            Self::Char(_) => "CHAR",
            Self::String(_) => "STRING",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::LeftBracket => "'['",
            Self::RightBracket => "']'",
            Self::LeftBrace => "'{'",
            Self::RightBrace => "'}'",
            Self::Less => "'<'",
            Self::Greater => "'>'",
            Self::Comma => "','",
            Self::Period => "'.'",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Assign => "'='",
            Self::At => "'@'",
            Self::Dollar => "'$'",
            Self::Hash => "'#'",
            Self::Package => "package",
            Self::Import => "import",
            Self::Enum => "enum",
            Self::Const => "const",
            Self::Struct => "struct",
            Self::Protocol => "protocol",
            Self::Service => "service",
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Extends => "extends",
        }
    }

    /// Returns `true` for identifiers and basic literals.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Ident(_) | Self::Int(_) | Self::Float(_) | Self::Char(_) | Self::String(_)
        )
    }

    /// Returns `true` for reserved words.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Package
                | Self::Import
                | Self::Enum
                | Self::Const
                | Self::Struct
                | Self::Protocol
                | Self::Service
                | Self::Required
                | Self::Optional
                | Self::Extends
        )
    }

    /// Returns `true` for punctuation and delimiters.
    #[must_use]
    pub const fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::LeftParen
                | Self::RightParen
                | Self::LeftBracket
                | Self::RightBracket
                | Self::LeftBrace
                | Self::RightBrace
                | Self::Less
                | Self::Greater
                | Self::Comma
                | Self::Period
                | Self::Semicolon
                | Self::Colon
                | Self::Assign
                | Self::At
                | Self::Dollar
                | Self::Hash
        )
    }

    /// Returns `true` if this is a comment.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Returns `true` if this is the end-of-file marker.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns `true` if this is an error token.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the source text carried by literal, comment and error tokens.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Comment(s)
            | Self::Error(s)
            | Self::Ident(s)
            | Self::Int(s)
            | Self::Float(s)
            | Self::Char(s)
            | Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Comment(s)
            | Self::Ident(s)
            | Self::Int(s)
            | Self::Float(s)
            | Self::Char(s)
            | Self::String(s) => write!(f, "{s}"),
            Self::Error(s) => write!(f, "<error: {s}>"),
            Self::Eof => write!(f, "<eof>"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::Less => write!(f, "<"),
            Self::Greater => write!(f, ">"),
            Self::Comma => write!(f, ","),
            Self::Period => write!(f, "."),
            Self::Semicolon => write!(f, ";"),
            Self::Colon => write!(f, ":"),
            Self::Assign => write!(f, "="),
            Self::At => write!(f, "@"),
            Self::Dollar => write!(f, "$"),
            Self::Hash => write!(f, "#"),
            keyword => f.write_str(keyword.name()),
        }
    }
}

/// A token with its source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the token kind.
    #[must_use]
    pub const fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Consumes the token and returns its kind.
    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    /// Returns the source span.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table() {
        for kw in [
            "package", "import", "enum", "const", "struct", "protocol", "service", "required",
            "optional", "extends",
        ] {
            let kind = TokenKind::keyword(kw).unwrap();
            assert!(kind.is_keyword());
            assert_eq!(kind.name(), kw);
            assert_eq!(kind.to_string(), kw);
        }
        assert_eq!(TokenKind::keyword("map"), None);
        assert_eq!(TokenKind::keyword("Struct"), None);
    }

    #[test]
    fn token_kind_names() {
        assert_eq!(TokenKind::Ident("x".into()).name(), "IDENT");
        assert_eq!(TokenKind::Int("1".into()).name(), "INT");
        assert_eq!(TokenKind::LeftBrace.name(), "'{'");
        assert_eq!(TokenKind::Eof.name(), "EOF");
    }

    #[test]
    fn token_kind_predicates() {
        assert!(TokenKind::String("\"a\"".into()).is_literal());
        assert!(!TokenKind::String("\"a\"".into()).is_operator());
        assert!(TokenKind::Hash.is_operator());
        assert!(TokenKind::Comment("// x".into()).is_comment());
        assert!(TokenKind::Eof.is_eof());
        assert!(TokenKind::Error("?".into()).is_error());
        assert!(!TokenKind::Struct.is_literal());
    }

    #[test]
    fn token_kind_display() {
        assert_eq!(TokenKind::String("`a`".into()).to_string(), "`a`");
        assert_eq!(TokenKind::LeftBrace.to_string(), "{");
        assert_eq!(TokenKind::Error("bad".into()).to_string(), "<error: bad>");
    }

    #[test]
    fn token_accessors() {
        let token = Token::new(TokenKind::Ident("User".into()), Span::new(3, 7));
        assert_eq!(token.span(), Span::new(3, 7));
        assert_eq!(token.kind().as_str(), Some("User"));
        assert_eq!(token.into_kind(), TokenKind::Ident("User".into()));
    }
}
