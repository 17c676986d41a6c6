// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Struct-tag strings: `json:"name" db:"user_name"`.
//!
//! A [`Tag`] is kept as its text. Every operation re-parses it, so a tag
//! never goes stale, and reading a malformed tag yields the pairs before the
//! first malformed one.
//!
//! ```
//! use mid_core::build::Tag;
//!
//! let mut tag = Tag::from(r#"json:"name" db:"user""#);
//! assert_eq!(tag.get("db"), "user");
//! tag.set("json", "full_name");
//! tag.delete("db");
//! assert_eq!(tag.as_str(), r#"json:"full_name""#);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source_analysis::{quote, unquote};

/// A tag annotation on a bean or field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value of the first pair named `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        let (mut pairs, index) = self.parse(key);
        index.map(|index| pairs.swap_remove(index).1)
    }

    /// Returns the value for `key`, or an empty string.
    #[must_use]
    pub fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default()
    }

    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.parse(key).1.is_some()
    }

    /// Sets the first pair named `key` in place, or appends a new pair.
    pub fn set(&mut self, key: &str, value: &str) {
        let (mut pairs, index) = self.parse(key);
        match index {
            Some(index) => pairs[index].1 = value.to_string(),
            None => pairs.push((key.to_string(), value.to_string())),
        }
        self.0 = format_pairs(&pairs);
    }

    /// Removes the first pair named `key`.
    pub fn delete(&mut self, key: &str) {
        let (mut pairs, index) = self.parse(key);
        if let Some(index) = index {
            pairs.remove(index);
        }
        self.0 = format_pairs(&pairs);
    }

    /// Returns every well-formed pair, in order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.parse("").0
    }

    /// Parses the pairs and finds the first one named `key`.
    fn parse(&self, key: &str) -> (Vec<(String, String)>, Option<usize>) {
        let mut pairs = Vec::new();
        let mut index = None;
        let mut rest = self.0.as_bytes();
        loop {
            rest = skip_space(rest);
            if rest.is_empty() {
                break;
            }
            let len = rest
                .iter()
                .take_while(|&&b| b > b' ' && b != b':' && b != b'"' && b != 0x7f)
                .count();
            if len == 0 || len + 1 >= rest.len() {
                break;
            }
            let name = String::from_utf8_lossy(&rest[..len]).into_owned();
            rest = skip_space(&rest[len..]);
            if rest.first() != Some(&b':') {
                break;
            }
            rest = skip_space(&rest[1..]);
            if rest.first() != Some(&b'"') {
                break;
            }

            let mut end = 1;
            while end < rest.len() && rest[end] != b'"' {
                if rest[end] == b'\\' {
                    end += 1;
                }
                end += 1;
            }
            if end >= rest.len() {
                break;
            }
            let quoted = String::from_utf8_lossy(&rest[..=end]).into_owned();
            rest = &rest[end + 1..];

            let Some(value) = unquote(&quoted) else {
                continue;
            };
            if index.is_none() && !key.is_empty() && name == key {
                index = Some(pairs.len());
            }
            pairs.push((name, value));
        }
        (pairs, index)
    }
}

fn skip_space(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn format_pairs(pairs: &[(String, String)]) -> String {
    let formatted: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{key}:{}", quote(value)))
        .collect();
    formatted.join(" ")
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Tag {
    fn from(text: String) -> Self {
        Self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_first_match() {
        let tag = Tag::from(r#"json:"a" xml:"b" json:"c""#);
        assert_eq!(tag.lookup("json").as_deref(), Some("a"));
        assert_eq!(tag.lookup("xml").as_deref(), Some("b"));
        assert_eq!(tag.lookup("yaml"), None);
        assert_eq!(tag.get("yaml"), "");
        assert!(!tag.has_key(""));
    }

    #[test]
    fn values_are_unquoted() {
        let tag = Tag::from(r#"doc:"line\none" q:"say \"hi\"""#);
        assert_eq!(tag.get("doc"), "line\none");
        assert_eq!(tag.get("q"), "say \"hi\"");
    }

    #[test]
    fn whitespace_around_separators() {
        let tag = Tag::from("  a : \"1\"\tb:\"2\"  ");
        assert_eq!(
            tag.pairs(),
            [("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn parsing_stops_at_malformed_pair() {
        let tag = Tag::from(r#"a:"1" b:2 c:"3""#);
        assert_eq!(tag.pairs().len(), 1);
        assert!(!tag.has_key("c"));

        let tag = Tag::from(r#"a:"1" b:"unterminated"#);
        assert_eq!(tag.pairs().len(), 1);
    }

    #[test]
    fn bad_escape_skips_pair() {
        let tag = Tag::from(r#"a:"\q" b:"2""#);
        assert_eq!(tag.pairs(), [("b".to_string(), "2".to_string())]);
    }

    #[test]
    fn set_replaces_in_place_and_appends() {
        let mut tag = Tag::from(r#"a:"1"  b:"2""#);
        tag.set("a", "one");
        assert_eq!(tag.as_str(), r#"a:"one" b:"2""#);
        tag.set("c", "tab\there");
        assert_eq!(tag.as_str(), r#"a:"one" b:"2" c:"tab\there""#);
    }

    #[test]
    fn set_on_malformed_tag_keeps_prefix() {
        let mut tag = Tag::from(r#"a:"1" broken c:"3""#);
        tag.set("d", "4");
        assert_eq!(tag.as_str(), r#"a:"1" d:"4""#);
    }

    #[test]
    fn delete_removes_first_match() {
        let mut tag = Tag::from(r#"a:"1" b:"2" a:"3""#);
        tag.delete("a");
        assert_eq!(tag.as_str(), r#"b:"2" a:"3""#);
        tag.delete("missing");
        assert_eq!(tag.as_str(), r#"b:"2" a:"3""#);
    }

    #[test]
    fn empty_tag() {
        let mut tag = Tag::default();
        assert!(tag.pairs().is_empty());
        tag.delete("a");
        assert!(tag.is_empty());
        tag.set("a", "");
        assert_eq!(tag.to_string(), r#"a:"""#);
    }

    #[test]
    fn serializes_as_plain_string() {
        let tag = Tag::from(r#"json:"x""#);
        assert_eq!(serde_json::to_string(&tag).unwrap(), r#""json:\"x\"""#);
    }
}
