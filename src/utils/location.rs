//! Source location tracking for tokens, AST nodes, and diagnostics.
//!
//! This module provides types for tracking source positions and spans,
//! which every token and AST node carries and which the diagnostic
//! printer uses to render annotated snippets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in source code (line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from start of file
    pub offset: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Create a location at the start of a file.
    pub fn start() -> Self {
        Self { line: 1, column: 1, offset: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span in source code (start and end positions).
///
/// The end points one past the last byte of the spanned text, so a
/// zero-width span has `start_offset == end_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed)
    pub end_column: usize,
    /// Byte offset of start
    pub start_offset: usize,
    /// Byte offset of end
    pub end_offset: usize,
}

impl Span {
    /// The unknown sentinel. Equal only to itself; `union` ignores it.
    pub const UNKNOWN: Span = Span {
        start_line: usize::MAX,
        start_column: usize::MAX,
        end_line: usize::MAX,
        end_column: usize::MAX,
        start_offset: usize::MAX,
        end_offset: usize::MAX,
    };

    /// Create a span from start and end locations.
    pub fn from_locations(start: SourceLocation, end: SourceLocation) -> Self {
        Self {
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
            start_offset: start.offset,
            end_offset: end.offset,
        }
    }

    /// Create a zero-width span at a single location.
    pub fn at(loc: SourceLocation) -> Self {
        Self::from_locations(loc, loc)
    }

    /// Check if this is the unknown sentinel.
    pub fn is_unknown(&self) -> bool {
        *self == Span::UNKNOWN
    }

    /// Get the start location.
    pub fn start(&self) -> SourceLocation {
        SourceLocation {
            line: self.start_line,
            column: self.start_column,
            offset: self.start_offset,
        }
    }

    /// Get the end location.
    pub fn end(&self) -> SourceLocation {
        SourceLocation {
            line: self.end_line,
            column: self.end_column,
            offset: self.end_offset,
        }
    }

    /// A zero-width span at the start of this span.
    pub fn before(&self) -> Span {
        Span::at(self.start())
    }

    /// A zero-width span at the end of this span.
    pub fn after(&self) -> Span {
        Span::at(self.end())
    }

    /// The sub-span starting `n` bytes into this span.
    ///
    /// Only valid within a single source line; token slicing never crosses
    /// a line break.
    pub fn slice_from(&self, n: usize) -> Span {
        Span {
            start_line: self.start_line,
            start_column: self.start_column + n,
            start_offset: self.start_offset + n,
            ..*self
        }
    }

    /// The sub-span covering the first `n` bytes of this span.
    ///
    /// Only valid within a single source line, like [`Span::slice_from`].
    pub fn slice_to(&self, n: usize) -> Span {
        Span {
            end_line: self.start_line,
            end_column: self.start_column + n,
            end_offset: self.start_offset + n,
            ..*self
        }
    }

    /// Merge two spans into their bounding box.
    ///
    /// The unknown sentinel is the identity element.
    pub fn union(&self, other: &Span) -> Span {
        if self.is_unknown() {
            return *other;
        }
        if other.is_unknown() {
            return *self;
        }
        let start = if self.start_offset <= other.start_offset {
            self.start()
        } else {
            other.start()
        };
        let end = if self.end_offset >= other.end_offset {
            self.end()
        } else {
            other.end()
        };
        Span::from_locations(start, end)
    }

    /// Check if this span fully contains another.
    pub fn contains(&self, other: &Span) -> bool {
        if self.is_unknown() || other.is_unknown() {
            return true;
        }
        self.start_offset <= other.start_offset && other.end_offset <= self.end_offset
    }

    /// Get the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "?:?");
        }
        if self.start_line == self.end_line {
            write!(f, "{}:{}-{}", self.start_line, self.start_column, self.end_column)
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.start_line, self.start_column, self.end_line, self.end_column
            )
        }
    }
}

/// A span paired with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    /// The source span
    pub span: Span,
    /// The source file URI
    pub file: String,
}

impl Location {
    /// Create a new location.
    pub fn new(span: Span, file: impl Into<String>) -> Self {
        Self { span, file: file.into() }
    }

    /// A location with the unknown span in an unnamed file.
    pub fn unknown() -> Self {
        Self { span: Span::UNKNOWN, file: String::new() }
    }

    /// The bounding box of two locations. The second file wins when the
    /// first is empty.
    pub fn union(&self, other: &Location) -> Location {
        let file = if self.file.is_empty() {
            other.file.clone()
        } else {
            self.file.clone()
        };
        Location { span: self.span.union(&other.span), file }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_unknown() {
            write!(f, "{}:?", self.file)
        } else {
            write!(f, "{}:{}", self.file, self.span.start())
        }
    }
}

/// Helper to look up lines of a source buffer by number.
#[derive(Debug, Clone)]
pub struct SourceMap {
    /// The source text
    source: String,
    /// Line start offsets
    line_starts: Vec<usize>,
}

impl SourceMap {
    /// Create a new source map.
    pub fn new(source: String) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { source, line_starts }
    }

    /// Get the source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Convert a byte offset to a source location.
    pub fn offset_to_location(&self, offset: usize) -> SourceLocation {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let column = offset - self.line_starts[line] + 1;
        SourceLocation::new(line + 1, column, offset)
    }

    /// Get the text for a span.
    pub fn span_text(&self, span: &Span) -> &str {
        &self.source[span.start_offset..span.end_offset]
    }

    /// Get a line of source code.
    pub fn line(&self, line_number: usize) -> Option<&str> {
        if line_number == 0 || line_number > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line_number - 1];
        let end = self
            .line_starts
            .get(line_number)
            .copied()
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        let span = Span::from_locations(
            SourceLocation::new(1, 5, 4),
            SourceLocation::new(1, 10, 9),
        );
        assert_eq!(format!("{}", span), "1:5-10");

        let span = Span::from_locations(
            SourceLocation::new(1, 5, 4),
            SourceLocation::new(3, 10, 30),
        );
        assert_eq!(format!("{}", span), "1:5-3:10");
    }

    #[test]
    fn test_span_union() {
        let a = Span::from_locations(SourceLocation::new(1, 1, 0), SourceLocation::new(1, 5, 4));
        let b = Span::from_locations(SourceLocation::new(1, 10, 9), SourceLocation::new(1, 15, 14));
        let merged = a.union(&b);
        assert_eq!(merged.start_column, 1);
        assert_eq!(merged.end_column, 15);
        assert!(merged.contains(&a));
        assert!(merged.contains(&b));
    }

    #[test]
    fn test_unknown_sentinel() {
        assert!(Span::UNKNOWN.is_unknown());
        assert_eq!(Span::UNKNOWN, Span::UNKNOWN);
        let a = Span::at(SourceLocation::new(2, 3, 10));
        assert_ne!(a, Span::UNKNOWN);
        assert_eq!(Span::UNKNOWN.union(&a), a);
        assert_eq!(a.union(&Span::UNKNOWN), a);
    }

    #[test]
    fn test_before_after() {
        let span =
            Span::from_locations(SourceLocation::new(2, 4, 12), SourceLocation::new(2, 9, 17));
        assert!(span.before().is_empty());
        assert_eq!(span.before().start_offset, 12);
        assert!(span.after().is_empty());
        assert_eq!(span.after().start_offset, 17);
    }

    #[test]
    fn test_slicing() {
        let span = Span::from_locations(SourceLocation::new(1, 3, 2), SourceLocation::new(1, 5, 4));
        let head = span.slice_to(1);
        let tail = span.slice_from(1);
        assert_eq!(head.len(), 1);
        assert_eq!(tail.len(), 1);
        assert_eq!(head.end_offset, tail.start_offset);
        assert_eq!(head.union(&tail), span);
    }

    #[test]
    fn test_source_map() {
        let source = "line1\nline2\nline3".to_string();
        let map = SourceMap::new(source);

        assert_eq!(map.line_count(), 3);
        assert_eq!(map.line(1), Some("line1"));
        assert_eq!(map.line(2), Some("line2"));
        assert_eq!(map.line(3), Some("line3"));

        let loc = map.offset_to_location(7); // 'i' in line2
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 2);
    }
}
