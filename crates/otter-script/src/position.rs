//! Position mapping between transformed and original source text.
//!
//! A [`PositionMap`] is produced once per transform call. Segments are appended
//! while the transformed text is emitted; the lookup index is only built the
//! first time a position is resolved, which for most compilations is never.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A location in source text.
///
/// Lines and columns are 1-based. Columns count Unicode scalar values, not
/// bytes or UTF-16 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start of a mapped span: everything from `generated` up to the next segment
/// on the same generated line maps to `original`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub generated: Position,
    pub original: Position,
}

/// Append-only mapping from transformed-text positions to original positions.
#[derive(Debug, Clone, Default)]
pub struct PositionMap {
    segments: Vec<Segment>,
    index: OnceLock<Vec<Segment>>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment. Invalidates the lookup index if it was already built.
    pub fn push(&mut self, generated: Position, original: Position) {
        self.segments.push(Segment {
            generated,
            original,
        });
        self.index = OnceLock::new();
    }

    /// Segments in insertion order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolve a transformed-text position to the original source.
    ///
    /// Returns `None` when the position precedes every segment on its line,
    /// i.e. it lies in code that has no counterpart in the original text.
    pub fn lookup(&self, generated: Position) -> Option<Position> {
        let index = self.index.get_or_init(|| {
            let mut sorted = self.segments.clone();
            // Stable sort: the first segment pushed for a location wins.
            sorted.sort_by_key(|s| s.generated);
            sorted.dedup_by_key(|s| s.generated);
            sorted
        });

        let upper = index.partition_point(|s| s.generated <= generated);
        let segment = index.get(upper.checked_sub(1)?)?;
        (segment.generated.line == generated.line).then_some(segment.original)
    }

    /// Move every generated position by `lines` lines, and additionally by
    /// `columns` columns for positions on the first line.
    ///
    /// Used when text without a newline-terminated end is inserted in front
    /// of the transformed output.
    pub fn offset(mut self, lines: u32, columns: u32) -> Self {
        for segment in &mut self.segments {
            if segment.generated.line == 1 {
                segment.generated.column += columns;
            }
            segment.generated.line += lines;
        }
        self.index = OnceLock::new();
        self
    }
}

impl PartialEq for PositionMap {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for PositionMap {}

impl FromIterator<Segment> for PositionMap {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
            index: OnceLock::new(),
        }
    }
}
