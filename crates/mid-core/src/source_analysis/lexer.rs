// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for midlang source code.
//!
//! This module converts source text into a stream of [`Token`]s. The lexer
//! is hand-written so that it can recover from any input.
//!
//! # Design Principles
//!
//! - **Error recovery**: Never panic on malformed input; emit [`TokenKind::Error`]
//!   or a best-effort literal and record a [`LexError`] on the side
//! - **Raw literals**: Literal tokens keep their exact source text
//! - **Global spans**: Spans are offset by the file's base in its
//!   [`FileSet`](super::FileSet)
//!
//! # Example
//!
//! ```
//! use mid_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("struct User {}").collect();
//! assert_eq!(tokens.len(), 4); // struct, User, {, } (EOF excluded from iterator)
//! assert_eq!(tokens[0].kind(), &TokenKind::Struct);
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{LexError, LexErrorKind, SourceFile, Span, Token, TokenKind};

/// A lexer that tokenizes midlang source code.
///
/// # Error Recovery
///
/// The lexer never fails completely. Unknown characters and unterminated
/// comments produce [`TokenKind::Error`] tokens. Malformed literals are still
/// returned as literals. In both cases a [`LexError`] is recorded and can be
/// collected with [`Lexer::take_errors`].
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
    /// Global position of byte 0.
    base: u32,
    /// Errors found so far.
    errors: Vec<LexError>,
    /// Offsets just past each newline consumed.
    line_starts: Vec<u32>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("base", &self.base)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer whose spans start at 0.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::with_base(source, 0)
    }

    /// Creates a new lexer whose spans start at `base`.
    #[must_use]
    pub fn with_base(source: &'src str, base: u32) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            base,
            errors: Vec::new(),
            line_starts: Vec::new(),
        }
    }

    /// Returns the errors recorded so far, leaving none behind.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Returns the file offsets at which a new line starts, in order.
    ///
    /// Only newlines already consumed are reported.
    #[must_use]
    pub fn line_starts(&self) -> &[u32] {
        &self.line_starts
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming (n=0 is same as `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        if c == '\n' {
            let offset = self.current_position();
            self.line_starts.push(offset);
        }
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position within the source.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are rejected by the file set"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    /// Creates a global span from the local offset `start` to the current position.
    fn span_from(&self, start: u32) -> Span {
        Span::new(self.base + start, self.base + self.current_position())
    }

    /// Extracts source text from the local offset `start` to the current position.
    fn text_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.position]
    }

    fn error(&mut self, kind: LexErrorKind, span: Span) {
        self.errors.push(LexError::new(kind, span));
    }

    /// Lexes the next token.
    fn lex_token(&mut self) -> Token {
        self.advance_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));

        let start = self.current_position();
        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => self.lex_token_kind(c, start),
        };
        Token::new(kind, self.span_from(start))
    }

    /// Lexes a token kind based on the first character.
    fn lex_token_kind(&mut self, c: char, start: u32) -> TokenKind {
        match c {
            // Identifiers and keywords
            c if is_ident_start(c) => self.lex_identifier_or_keyword(start),

            // Numbers, including `.5`
            '0'..='9' => self.lex_number(start),
            '.' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.lex_number(start)
            }

            // Literals
            '"' => self.lex_string(start),
            '`' => self.lex_raw_string(start),
            '\'' => self.lex_char(start),

            // Comments
            '/' if self.peek_char_n(1) == Some('/') => self.lex_line_comment(start),
            '/' if self.peek_char_n(1) == Some('*') => self.lex_block_comment(start),

            // Single-character tokens
            _ => {
                self.advance();
                match c {
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    '[' => TokenKind::LeftBracket,
                    ']' => TokenKind::RightBracket,
                    '{' => TokenKind::LeftBrace,
                    '}' => TokenKind::RightBrace,
                    '<' => TokenKind::Less,
                    '>' => TokenKind::Greater,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Period,
                    ';' => TokenKind::Semicolon,
                    ':' => TokenKind::Colon,
                    '=' => TokenKind::Assign,
                    '@' => TokenKind::At,
                    '$' => TokenKind::Dollar,
                    '#' => TokenKind::Hash,
                    // Unknown character - error recovery
                    _ => {
                        let span = self.span_from(start);
                        self.errors.push(LexError::unexpected_char(c, span));
                        TokenKind::Error(EcoString::from(self.text_from(start)))
                    }
                }
            }
        }
    }

    /// Lexes an identifier, then checks the keyword table.
    fn lex_identifier_or_keyword(&mut self, start: u32) -> TokenKind {
        self.advance_while(is_ident_continue);
        let text = self.text_from(start);
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Ident(EcoString::from(text)))
    }

    /// Lexes an integer or float literal.
    ///
    /// Accepts decimal, `0x` hexadecimal and leading-zero octal integers,
    /// and decimal floats with a fraction and/or an exponent.
    fn lex_number(&mut self, start: u32) -> TokenKind {
        let mut is_float = false;
        let mut invalid: Option<&'static str> = None;

        if self.peek_char() == Some('0') && matches!(self.peek_char_n(1), Some('x' | 'X')) {
            self.advance(); // 0
            self.advance(); // x
            let digits = self.current_position();
            self.advance_while(|c| c.is_ascii_hexdigit());
            if self.current_position() == digits {
                self.error(
                    LexErrorKind::InvalidNumber("hexadecimal literal has no digits"),
                    self.span_from(start),
                );
            }
            return TokenKind::Int(EcoString::from(self.text_from(start)));
        }

        self.advance_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') {
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit());
            is_float = true;
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.advance(); // e
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance_while(|c| c.is_ascii_digit());
            } else {
                invalid = Some("exponent has no digits");
            }
            is_float = true;
        }

        let text = self.text_from(start);
        if !is_float
            && text.len() > 1
            && text.starts_with('0')
            && text.bytes().any(|b| b == b'8' || b == b'9')
        {
            invalid = Some("invalid digit in octal literal");
        }
        if let Some(reason) = invalid {
            self.error(LexErrorKind::InvalidNumber(reason), self.span_from(start));
        }

        let text = EcoString::from(text);
        if is_float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        }
    }

    /// Lexes an interpreted string: `"..."`
    fn lex_string(&mut self, start: u32) -> TokenKind {
        self.advance(); // opening "
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    self.errors
                        .push(LexError::unterminated_string(self.span_from(start)));
                    break;
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => self.lex_escape('"'),
                Some(_) => {
                    self.advance();
                }
            }
        }
        TokenKind::String(EcoString::from(self.text_from(start)))
    }

    /// Lexes a raw string: `` `...` ``, which may span lines.
    fn lex_raw_string(&mut self, start: u32) -> TokenKind {
        self.advance(); // opening `
        loop {
            match self.advance() {
                None => {
                    self.errors
                        .push(LexError::unterminated_string(self.span_from(start)));
                    break;
                }
                Some('`') => break,
                Some(_) => {}
            }
        }
        TokenKind::String(EcoString::from(self.text_from(start)))
    }

    /// Lexes a character literal: `'x'` or `'\n'`
    fn lex_char(&mut self, start: u32) -> TokenKind {
        self.advance(); // opening '
        let mut count = 0;
        let terminated = loop {
            match self.peek_char() {
                None | Some('\n') => break false,
                Some('\'') => {
                    self.advance();
                    break true;
                }
                Some('\\') => {
                    self.lex_escape('\'');
                    count += 1;
                }
                Some(_) => {
                    self.advance();
                    count += 1;
                }
            }
        };
        if !terminated || count != 1 {
            self.error(LexErrorKind::InvalidCharacter, self.span_from(start));
        }
        TokenKind::Char(EcoString::from(self.text_from(start)))
    }

    /// Validates one escape sequence, starting at the backslash.
    ///
    /// On an invalid escape the offending character is left unconsumed so
    /// the enclosing literal can still find its closing quote.
    fn lex_escape(&mut self, quote: char) {
        let start = self.current_position();
        self.advance(); // backslash
        let Some(c) = self.peek_char() else {
            return; // reported as unterminated by the caller
        };
        let (digits, radix, max) = match c {
            'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' => {
                self.advance();
                return;
            }
            c if c == quote => {
                self.advance();
                return;
            }
            '0'..='7' => (3, 8, 255),
            'x' => {
                self.advance();
                (2, 16, 255)
            }
            'u' => {
                self.advance();
                (4, 16, 0x0010_FFFF)
            }
            'U' => {
                self.advance();
                (8, 16, 0x0010_FFFF)
            }
            _ => {
                self.error(LexErrorKind::InvalidEscape(c), self.span_from(start));
                return;
            }
        };

        let mut value: u32 = 0;
        for _ in 0..digits {
            match self.peek_char().and_then(|d| d.to_digit(radix)) {
                Some(d) => {
                    value = value * radix + d;
                    self.advance();
                }
                None => {
                    self.error(LexErrorKind::InvalidEscape(c), self.span_from(start));
                    return;
                }
            }
        }
        if value > max || (0xD800..0xE000).contains(&value) {
            self.error(LexErrorKind::InvalidCodePoint, self.span_from(start));
        }
    }

    /// Lexes a line comment: `// ...`
    fn lex_line_comment(&mut self, start: u32) -> TokenKind {
        self.advance_while(|c| c != '\n');
        let text = self.text_from(start);
        TokenKind::Comment(EcoString::from(text.strip_suffix('\r').unwrap_or(text)))
    }

    /// Lexes a block comment: `/* ... */`. Block comments nest.
    fn lex_block_comment(&mut self, start: u32) -> TokenKind {
        self.advance(); // /
        self.advance(); // *
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_char() {
                None => {
                    self.errors
                        .push(LexError::unterminated_comment(self.span_from(start)));
                    return TokenKind::Error(EcoString::from(self.text_from(start)));
                }
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance(); // *
                    self.advance(); // /
                    depth -= 1;
                }
                Some('/') if self.peek_char_n(1) == Some('*') => {
                    self.advance(); // /
                    self.advance(); // *
                    depth += 1;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        TokenKind::Comment(EcoString::from(self.text_from(start)))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lex_token();
        if token.kind().is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

/// Convenience function to lex source into a vector of tokens (excluding EOF).
///
/// For most use cases, prefer using the `Lexer` iterator directly.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Convenience function to lex source into a vector of tokens including EOF.
#[must_use]
pub fn lex_with_eof(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    collect_with_eof(&mut lexer)
}

/// Lexes the content of a registered file.
///
/// Spans are global positions within the file's set, and every line start
/// is recorded with `file`. The returned tokens end with EOF.
pub fn lex_file(file: &mut SourceFile, source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::with_base(source, file.base());
    let tokens = collect_with_eof(&mut lexer);
    for &offset in lexer.line_starts() {
        file.add_line(offset);
    }
    (tokens, lexer.take_errors())
}

fn collect_with_eof(lexer: &mut Lexer<'_>) -> Vec<Token> {
    let mut tokens = Vec::new();
    loop {
        let token = lexer.lex_token();
        let is_eof = token.kind().is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}
