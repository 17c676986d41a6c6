// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Decoding and encoding of quoted literals.
//!
//! [`unquote`] interprets the raw text of a `"..."`, `` `...` `` or `'x'`
//! literal as the lexer produced it. [`quote`] is its inverse for
//! interpreted strings and is what struct tags are re-serialised with.

/// Decodes a quoted literal.
///
/// Returns `None` if `raw` is not a single well-formed literal, or if its
/// byte escapes do not form valid UTF-8.
///
/// ```
/// use mid_core::source_analysis::unquote;
///
/// assert_eq!(unquote(r#""a\tb""#).as_deref(), Some("a\tb"));
/// assert_eq!(unquote("`raw\\n`").as_deref(), Some("raw\\n"));
/// assert_eq!(unquote(r#""open"#), None);
/// ```
#[must_use]
pub fn unquote(raw: &str) -> Option<String> {
    let quote = raw.chars().next()?;
    if !matches!(quote, '"' | '\'' | '`') || raw.len() < 2 || !raw.ends_with(quote) {
        return None;
    }
    let body = &raw[1..raw.len() - 1];
    match quote {
        '`' => {
            if body.contains('`') {
                return None;
            }
            Some(body.replace('\r', ""))
        }
        _ => {
            let mut bytes = Vec::with_capacity(body.len());
            let mut rest = body;
            let mut count = 0;
            while !rest.is_empty() {
                rest = unquote_char(rest, quote, &mut bytes)?;
                count += 1;
            }
            if quote == '\'' && count != 1 {
                return None;
            }
            String::from_utf8(bytes).ok()
        }
    }
}

/// Decodes the first character or escape of `s` into `out`, returning the
/// remaining input.
fn unquote_char<'a>(s: &'a str, quote: char, out: &mut Vec<u8>) -> Option<&'a str> {
    let mut chars = s.chars();
    let c = chars.next()?;
    if c == quote || c == '\n' {
        return None;
    }
    if c != '\\' {
        push_char(out, c);
        return Some(chars.as_str());
    }
    let escape = chars.next()?;
    let simple = match escape {
        'a' => Some('\x07'),
        'b' => Some('\x08'),
        'f' => Some('\x0c'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0b'),
        '\\' => Some('\\'),
        '\'' | '"' if escape == quote => Some(escape),
        _ => None,
    };
    if let Some(decoded) = simple {
        push_char(out, decoded);
        return Some(chars.as_str());
    }
    let rest = chars.as_str();
    match escape {
        'x' => {
            let (value, rest) = take_digits(rest, 2, 16)?;
            out.push(u8::try_from(value).ok()?);
            Some(rest)
        }
        'u' | 'U' => {
            let width = if escape == 'u' { 4 } else { 8 };
            let (value, rest) = take_digits(rest, width, 16)?;
            push_char(out, char::from_u32(value)?);
            Some(rest)
        }
        '0'..='7' => {
            let (value, rest) = take_digits(s.get(1..)?, 3, 8)?;
            out.push(u8::try_from(value).ok()?);
            Some(rest)
        }
        _ => None,
    }
}

/// Takes exactly `width` digits in `radix` from the front of `s`.
fn take_digits(s: &str, width: usize, radix: u32) -> Option<(u32, &str)> {
    let digits = s.get(..width)?;
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = u32::from_str_radix(digits, radix).ok()?;
    Some((value, &s[width..]))
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Encodes `text` as a double-quoted literal.
///
/// ```
/// use mid_core::source_analysis::quote;
///
/// assert_eq!(quote("say \"hi\"\n"), r#""say \"hi\"\n""#);
/// ```
#[must_use]
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            c if c.is_control() => {
                let code = u32::from(c);
                if code < 0x80 {
                    out.push_str(&format!("\\x{code:02x}"));
                } else {
                    out.push_str(&format!("\\u{code:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_interpreted_escapes() {
        assert_eq!(
            unquote(r#""\a\b\f\n\r\t\v\\\"""#).as_deref(),
            Some("\x07\x08\x0c\n\r\t\x0b\\\"")
        );
        assert_eq!(unquote(r#""\101\x42C\U00000044""#).as_deref(), Some("ABCD"));
        assert_eq!(unquote(r#""héllo""#).as_deref(), Some("héllo"));
        assert_eq!(unquote(r#""""#).as_deref(), Some(""));
    }

    #[test]
    fn unquote_rejects_malformed() {
        assert_eq!(unquote(""), None);
        assert_eq!(unquote("\""), None);
        assert_eq!(unquote(r#""a"b""#), None);
        assert_eq!(unquote(r#""\q""#), None);
        assert_eq!(unquote(r#""\'""#), None);
        assert_eq!(unquote(r#""\x4""#), None);
        assert_eq!(unquote(r#""\777""#), None);
        assert_eq!(unquote(r#""\uD800""#), None);
        assert_eq!(unquote("\"a\nb\""), None);
        assert_eq!(unquote("plain"), None);
    }

    #[test]
    fn unquote_raw_strings() {
        assert_eq!(unquote("`a\\tb`").as_deref(), Some("a\\tb"));
        assert_eq!(unquote("`line\r\nbreak`").as_deref(), Some("line\nbreak"));
        assert_eq!(unquote("`a`b`"), None);
    }

    #[test]
    fn unquote_char_literals() {
        assert_eq!(unquote("'x'").as_deref(), Some("x"));
        assert_eq!(unquote(r"'\''").as_deref(), Some("'"));
        assert_eq!(unquote("''"), None);
        assert_eq!(unquote("'ab'"), None);
    }

    #[test]
    fn unquote_invalid_utf8_bytes() {
        assert_eq!(unquote(r#""\xff""#), None);
        assert_eq!(unquote(r#""\xc3\xa9""#).as_deref(), Some("é"));
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\\b"), r#""a\\b""#);
        assert_eq!(quote("\t\x01"), r#""\t\x01""#);
        assert_eq!(quote("\u{85}"), r#""\u0085""#);
        assert_eq!(quote("日本"), "\"日本\"");
    }

    #[test]
    fn quote_then_unquote() {
        for text in ["", "json:\"id\"", "tab\there", "\x00\x7f", "ünïcødé"] {
            assert_eq!(unquote(&quote(text)).as_deref(), Some(text));
        }
    }
}
