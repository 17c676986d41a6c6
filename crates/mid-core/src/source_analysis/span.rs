// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source location tracking.
//!
//! Positions are global: every file registered with a
//! [`FileSet`](super::FileSet) owns a disjoint range of [`Pos`] values, so a
//! single `u32` identifies both the file and the byte offset within it.

use std::fmt;
use std::ops::Range;

/// A compact global source position.
///
/// `Pos::NONE` (zero) is reserved for "no position"; real positions start at
/// the base of the file they belong to.
///
/// # Examples
///
/// ```
/// use mid_core::source_analysis::Pos;
///
/// assert!(!Pos::NONE.is_valid());
/// assert!(Pos::new(1).is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos(u32);

impl Pos {
    /// The reserved "no position" value.
    pub const NONE: Self = Self(0);

    /// Creates a position from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` unless this is [`Pos::NONE`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A span of source code, represented as a range of global positions.
///
/// Spans are used throughout the compiler to track the source location
/// of tokens and diagnostics.
///
/// # Examples
///
/// ```
/// use mid_core::source_analysis::Span;
///
/// let span = Span::new(0, 10);
/// assert_eq!(span.start(), 0);
/// assert_eq!(span.end(), 10);
/// assert_eq!(span.len(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    /// Creates a new span from start and end positions.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Creates an empty span at `pos`.
    #[must_use]
    pub const fn at(pos: Pos) -> Self {
        Self::new(pos.0, pos.0)
    }

    /// Returns the start position.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Returns the end position (exclusive).
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Returns the start as a [`Pos`].
    #[must_use]
    pub const fn pos(self) -> Pos {
        Pos(self.start)
    }

    /// Returns the end as a [`Pos`].
    #[must_use]
    pub const fn end_pos(self) -> Pos {
        Pos(self.end)
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Returns true if `other` is fully contained within `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Creates a span that covers both `self` and `other`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Returns a copy shifted left by `base`, turning global positions into
    /// offsets relative to a file that starts at `base`.
    #[must_use]
    pub const fn relative_to(self, base: u32) -> Self {
        Self {
            start: self.start.saturating_sub(base),
            end: self.end.saturating_sub(base),
        }
    }

    /// Converts to a `Range<usize>` for indexing into source text.
    ///
    /// Only meaningful for spans produced with base 0 or after
    /// [`Span::relative_to`].
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Range<u32>> for Span {
    fn from(range: Range<u32>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<Range<usize>> for Span {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source sets over 4GB are not supported"
    )]
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.as_range()
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start as usize, span.len() as usize).into()
    }
}
