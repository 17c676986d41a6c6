// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Mapping global positions back to files, lines and columns.
//!
//! **DDD Context:** Source Analysis
//!
//! A [`FileSet`] hands out disjoint, increasing ranges of [`Pos`] values, one
//! per registered [`SourceFile`]. Each file records the offsets at which its
//! lines start, so resolving a position is two binary searches: one over file
//! bases and one over line starts.

use std::cell::Cell;
use std::fmt;

use ecow::EcoString;
use thiserror::Error;

use super::{Pos, Span};

/// Errors raised while registering files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileSetError {
    /// An explicit base was below the next free position.
    #[error("illegal base {base}: positions below {watermark} are already in use")]
    BaseBelowWatermark { base: u32, watermark: u32 },

    /// The file would push positions past `u32::MAX`.
    #[error("position overflow: more than 4GB of source in file set")]
    Overflow,
}

/// Handle to a file registered in a [`FileSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u32);

impl FileId {
    /// Returns the index of the file within its set.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A resolved source location.
///
/// A `Position` is valid when its line is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Filename, if any.
    pub filename: EcoString,
    /// Byte offset from the start of the file, starting at 0.
    pub offset: u32,
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1 (bytes from the line start).
    pub column: u32,
}

impl Position {
    /// Returns `true` if this position refers to a real line.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filename.is_empty() {
            f.write_str("<input>")?;
        } else {
            f.write_str(&self.filename)?;
        }
        if self.is_valid() {
            write!(f, ":{}:{}", self.line, self.column)?;
        }
        Ok(())
    }
}

/// A `//line`-style remapping: text from `offset` on is reported as
/// `filename:line`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LineInfo {
    offset: u32,
    filename: EcoString,
    line: u32,
}

/// A file registered in a [`FileSet`].
#[derive(Debug, Clone)]
pub struct SourceFile {
    id: FileId,
    name: EcoString,
    base: u32,
    size: u32,
    lines: Vec<u32>,
    infos: Vec<LineInfo>,
}

impl SourceFile {
    /// Returns the handle of this file.
    #[must_use]
    pub const fn id(&self) -> FileId {
        self.id
    }

    /// Returns the file name as registered.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the position of offset 0.
    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Returns the number of known lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Records that a new line starts at `offset`.
    ///
    /// Ignored unless `offset` is past the last recorded line start and
    /// inside the file. EOF counts as inside, so a trailing newline opens an
    /// empty last line.
    pub fn add_line(&mut self, offset: u32) {
        let increasing = self.lines.last().is_none_or(|&last| last < offset);
        if increasing && offset <= self.size {
            self.lines.push(offset);
        }
    }

    /// Replaces all line starts.
    ///
    /// Returns `false` and leaves the file untouched if `lines` is not
    /// strictly increasing or points outside the file.
    pub fn set_lines(&mut self, lines: Vec<u32>) -> bool {
        let ordered = lines.windows(2).all(|w| w[0] < w[1]);
        let in_bounds = lines.iter().all(|&offset| offset <= self.size);
        if !ordered || !in_bounds {
            return false;
        }
        self.lines = lines;
        true
    }

    /// Computes line starts directly from the file content.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "file sizes are bounded by u32 at registration"
    )]
    pub fn set_lines_for_content(&mut self, content: &[u8]) {
        let mut lines = vec![0];
        for (offset, &byte) in content.iter().enumerate() {
            if byte == b'\n' {
                lines.push(offset as u32 + 1);
            }
        }
        self.lines = lines;
    }

    /// Adds a remapping so that text from `offset` on reports as
    /// `filename:line`.
    pub fn add_line_info(&mut self, offset: u32, filename: impl Into<EcoString>, line: u32) {
        let increasing = self.infos.last().is_none_or(|last| last.offset < offset);
        if increasing && offset < self.size {
            self.infos.push(LineInfo {
                offset,
                filename: filename.into(),
                line,
            });
        }
    }

    /// Returns `true` if `pos` falls inside this file (EOF included).
    #[must_use]
    pub const fn contains(&self, pos: Pos) -> bool {
        self.base <= pos.raw() && pos.raw() <= self.base + self.size
    }

    /// Converts a file offset to a global position.
    #[must_use]
    pub const fn pos(&self, offset: u32) -> Option<Pos> {
        if offset > self.size {
            None
        } else {
            Some(Pos::new(self.base + offset))
        }
    }

    /// Converts a global position to a file offset.
    #[must_use]
    pub const fn offset(&self, pos: Pos) -> Option<u32> {
        if self.contains(pos) {
            Some(pos.raw() - self.base)
        } else {
            None
        }
    }

    /// Returns the (adjusted) line of `pos`, or 0 if it is not in this file.
    #[must_use]
    pub fn line(&self, pos: Pos) -> u32 {
        self.position(pos).line
    }

    /// Converts a global span into one relative to this file's start.
    #[must_use]
    pub const fn local_span(&self, span: Span) -> Span {
        span.relative_to(self.base)
    }

    /// Resolves `pos`, honouring line remappings.
    #[must_use]
    pub fn position(&self, pos: Pos) -> Position {
        self.position_for(pos, true)
    }

    /// Resolves `pos`, ignoring line remappings.
    #[must_use]
    pub fn unadjusted_position(&self, pos: Pos) -> Position {
        self.position_for(pos, false)
    }

    fn position_for(&self, pos: Pos, adjusted: bool) -> Position {
        if !pos.is_valid() || !self.contains(pos) {
            return Position::default();
        }
        let offset = pos.raw() - self.base;
        let (filename, line, column) = self.unpack(offset, adjusted);
        Position {
            filename,
            offset,
            line,
            column,
        }
    }

    fn unpack(&self, offset: u32, adjusted: bool) -> (EcoString, u32, u32) {
        let mut filename = self.name.clone();
        let (mut line, mut column) = (0, 0);
        if let Some(i) = search_ints(&self.lines, offset) {
            line = index_to_line(i);
            column = offset - self.lines[i] + 1;
        }
        if adjusted {
            let found = self.infos.partition_point(|info| info.offset <= offset);
            if let Some(alt) = found.checked_sub(1).map(|i| &self.infos[i]) {
                filename = alt.filename.clone();
                if let Some(i) = search_ints(&self.lines, alt.offset) {
                    let shifted =
                        i64::from(line) + i64::from(alt.line) - i64::from(index_to_line(i));
                    line = u32::try_from(shifted).unwrap_or(0);
                }
            }
        }
        (filename, line, column)
    }
}

/// Returns the index of the last element `<= x`.
fn search_ints(lines: &[u32], x: u32) -> Option<usize> {
    lines.partition_point(|&start| start <= x).checked_sub(1)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "line counts are bounded by the u32 file size"
)]
const fn index_to_line(index: usize) -> u32 {
    index as u32 + 1
}

/// The set of files taking part in one compilation.
///
/// # Examples
///
/// ```
/// use mid_core::source_analysis::FileSet;
///
/// let mut fset = FileSet::new();
/// let id = fset.add_file("a.mid", None, 10).unwrap();
/// let file = fset.file_mut(id);
/// file.add_line(4);
/// let pos = file.pos(6).unwrap();
/// assert_eq!(fset.position(pos).to_string(), "a.mid:2:3");
/// ```
#[derive(Debug, Clone)]
pub struct FileSet {
    base: u32,
    files: Vec<SourceFile>,
    last: Cell<Option<usize>>,
}

impl FileSet {
    /// Creates an empty set. The first file starts at position 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: 1,
            files: Vec::new(),
            last: Cell::new(None),
        }
    }

    /// Returns the next free position.
    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Returns the number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no file is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Registers a file of `size` bytes.
    ///
    /// `base` of `None` picks the next free position. An explicit base must
    /// not precede it.
    pub fn add_file(
        &mut self,
        name: impl Into<EcoString>,
        base: Option<u32>,
        size: usize,
    ) -> Result<FileId, FileSetError> {
        let base = base.unwrap_or(self.base);
        if base < self.base {
            return Err(FileSetError::BaseBelowWatermark {
                base,
                watermark: self.base,
            });
        }
        let size = u32::try_from(size).map_err(|_| FileSetError::Overflow)?;
        // +1 because EOF also has a position
        let next = base
            .checked_add(size)
            .and_then(|end| end.checked_add(1))
            .ok_or(FileSetError::Overflow)?;
        let index = u32::try_from(self.files.len()).map_err(|_| FileSetError::Overflow)?;
        let id = FileId(index);
        self.files.push(SourceFile {
            id,
            name: name.into(),
            base,
            size,
            lines: vec![0],
            infos: Vec::new(),
        });
        self.base = next;
        self.last.set(Some(id.index()));
        Ok(id)
    }

    /// Returns the file behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different set.
    #[must_use]
    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    /// Returns the file behind `id` for line registration.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different set.
    pub fn file_mut(&mut self, id: FileId) -> &mut SourceFile {
        &mut self.files[id.index()]
    }

    /// Finds the file containing `pos`.
    #[must_use]
    pub fn file_at(&self, pos: Pos) -> Option<&SourceFile> {
        if !pos.is_valid() {
            return None;
        }
        if let Some(file) = self.last.get().and_then(|i| self.files.get(i)) {
            if file.contains(pos) {
                return Some(file);
            }
        }
        let index = self
            .files
            .partition_point(|file| file.base <= pos.raw())
            .checked_sub(1)?;
        let file = &self.files[index];
        if file.contains(pos) {
            self.last.set(Some(index));
            Some(file)
        } else {
            None
        }
    }

    /// Resolves `pos` to a [`Position`], honouring line remappings.
    #[must_use]
    pub fn position(&self, pos: Pos) -> Position {
        self.file_at(pos)
            .map(|file| file.position(pos))
            .unwrap_or_default()
    }

    /// Resolves `pos` to a [`Position`], ignoring line remappings.
    #[must_use]
    pub fn unadjusted_position(&self, pos: Pos) -> Position {
        self.file_at(pos)
            .map(|file| file.unadjusted_position(pos))
            .unwrap_or_default()
    }

    /// Iterates files in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with_content(fset: &mut FileSet, name: &str, content: &str) -> FileId {
        let id = fset.add_file(name, None, content.len()).unwrap();
        fset.file_mut(id).set_lines_for_content(content.as_bytes());
        id
    }

    #[test]
    fn bases_are_disjoint_and_increasing() {
        let mut fset = FileSet::new();
        let a = fset.add_file("a", None, 10).unwrap();
        let b = fset.add_file("b", None, 5).unwrap();
        assert_eq!(fset.file(a).base(), 1);
        assert_eq!(fset.file(b).base(), 12);
        assert_eq!(fset.base(), 18);
    }

    #[test]
    fn explicit_base_below_watermark_fails() {
        let mut fset = FileSet::new();
        fset.add_file("a", None, 10).unwrap();
        let err = fset.add_file("b", Some(5), 3).unwrap_err();
        assert_eq!(
            err,
            FileSetError::BaseBelowWatermark {
                base: 5,
                watermark: 12
            }
        );
        assert!(fset.add_file("c", Some(100), 3).is_ok());
        assert_eq!(fset.base(), 104);
    }

    #[test]
    fn overflow_is_reported() {
        let mut fset = FileSet::new();
        let err = fset.add_file("big", Some(u32::MAX - 2), 5).unwrap_err();
        assert_eq!(err, FileSetError::Overflow);
    }

    #[test]
    fn add_line_ignores_out_of_order_offsets() {
        let mut fset = FileSet::new();
        let id = fset.add_file("a", None, 20).unwrap();
        let file = fset.file_mut(id);
        file.add_line(5);
        file.add_line(5);
        file.add_line(3);
        file.add_line(25);
        file.add_line(10);
        assert_eq!(file.line_count(), 3);
    }

    #[test]
    fn set_lines_rejects_unordered_input() {
        let mut fset = FileSet::new();
        let id = fset.add_file("a", None, 20).unwrap();
        let file = fset.file_mut(id);
        assert!(!file.set_lines(vec![0, 8, 4]));
        assert!(!file.set_lines(vec![0, 21]));
        assert!(file.set_lines(vec![0, 4, 8]));
        assert_eq!(file.line_count(), 3);
        assert!(file.set_lines(vec![0, 20]));
    }

    #[test]
    fn eof_after_trailing_newline_starts_a_new_line() {
        let mut fset = FileSet::new();
        let source = "ab\n";
        let id = file_with_content(&mut fset, "a.mid", source);
        let eof = fset.file(id).pos(3).unwrap();
        assert_eq!(fset.position(eof).to_string(), "a.mid:2:1");

        let id = fset.add_file("b.mid", None, source.len()).unwrap();
        let file = fset.file_mut(id);
        file.add_line(3);
        assert_eq!(file.line_count(), 2);
        let eof = file.pos(3).unwrap();
        assert_eq!(fset.position(eof).to_string(), "b.mid:2:1");
    }

    #[test]
    fn resolves_line_and_column() {
        let mut fset = FileSet::new();
        let source = "package a\nstruct B {\n}\n";
        let id = file_with_content(&mut fset, "a.mid", source);
        let file = fset.file(id);
        let pos = file.pos(12).unwrap(); // `r` in struct
        let position = fset.position(pos);
        assert_eq!(position.filename, "a.mid");
        assert_eq!(position.offset, 12);
        assert_eq!(position.line, 2);
        assert_eq!(position.column, 3);
        assert_eq!(position.to_string(), "a.mid:2:3");
    }

    #[test]
    fn resolves_positions_across_files() {
        let mut fset = FileSet::new();
        let a = file_with_content(&mut fset, "a.mid", "x\ny\n");
        let b = file_with_content(&mut fset, "b.mid", "p\nq\nr");
        let pa = fset.file(a).pos(2).unwrap();
        let pb = fset.file(b).pos(4).unwrap();
        assert_eq!(fset.position(pb).to_string(), "b.mid:3:1");
        assert_eq!(fset.position(pa).to_string(), "a.mid:2:1");
        assert_eq!(fset.file_at(pb).map(SourceFile::id), Some(b));
    }

    #[test]
    fn no_pos_short_circuits() {
        let mut fset = FileSet::new();
        file_with_content(&mut fset, "a.mid", "abc");
        let position = fset.position(Pos::NONE);
        assert!(!position.is_valid());
        assert_eq!(position.to_string(), "<input>");
        assert!(fset.file_at(Pos::new(1000)).is_none());
    }

    #[test]
    fn eof_position_belongs_to_file() {
        let mut fset = FileSet::new();
        let id = file_with_content(&mut fset, "a.mid", "ab\ncd");
        let eof = fset.file(id).pos(5).unwrap();
        assert_eq!(fset.position(eof).to_string(), "a.mid:2:3");
        assert!(fset.file(id).pos(6).is_none());
    }

    #[test]
    fn line_info_remaps_positions() {
        let mut fset = FileSet::new();
        let id = file_with_content(&mut fset, "gen.mid", "a\nb\nc\nd\n");
        let file = fset.file_mut(id);
        file.add_line_info(4, "orig.mid", 10);
        let pos = file.pos(6).unwrap(); // line 4 of gen.mid
        assert_eq!(fset.position(pos).to_string(), "orig.mid:11:1");
        assert_eq!(fset.unadjusted_position(pos).to_string(), "gen.mid:4:1");
        let before = fset.file(id).pos(2).unwrap();
        assert_eq!(fset.position(before).to_string(), "gen.mid:2:1");
    }

    #[test]
    fn position_display_without_filename() {
        let position = Position {
            filename: EcoString::new(),
            offset: 3,
            line: 1,
            column: 4,
        };
        assert_eq!(position.to_string(), "<input>:1:4");
    }
}
