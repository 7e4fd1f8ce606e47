//! Source positions and ranges.
//!
//! All positions in this crate are 0-based line/column pairs. Front-end
//! compilers that report 1-based positions are normalized at the adapter
//! boundary via [`Position::from_one_based`] before any of this code sees
//! them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 0-based line/column position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 0-based line.
    pub line: u32,
    /// 0-based column, measured in characters.
    pub column: u32,
}

impl Position {
    /// Create a position from 0-based line and column.
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Create a position from 1-based line and column, shifting both down.
    ///
    /// Values of 0 are clamped rather than wrapped, so a front end that
    /// reports "line 0" for synthetic nodes still yields a valid position.
    pub const fn from_one_based(line: u32, column: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            column: column.saturating_sub(1),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open-feeling but inclusive range `[start, end]` in a document.
///
/// Containment is inclusive of the end position so that a cursor sitting
/// just past the last character of an identifier still hits its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start of the range.
    pub start: Position,
    /// End of the range (inclusive).
    pub end: Position,
}

impl Range {
    /// Create a range from start and end positions.
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width range at a single position.
    pub const fn point(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// Whether `pos` falls inside this range (inclusive at both ends).
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether `other` lies entirely inside this range.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Size key for "smallest range wins" comparisons: line span first,
    /// then column span. Not a length in characters, but totally ordered
    /// and consistent with structural nesting.
    pub fn size_key(&self) -> (u32, u32) {
        let lines = self.end.line.saturating_sub(self.start.line);
        let cols = if lines == 0 {
            self.end.column.saturating_sub(self.start.column)
        } else {
            self.end.column
        };
        (lines, cols)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
