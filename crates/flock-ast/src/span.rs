//! Source location tracking for error reporting.
//!
//! A [`Span`] is a byte range into the original source text. Spans stay
//! compact and copyable; converting them into human-readable line/column
//! positions is done on demand through a [`SourceFile`], which keeps a
//! precomputed index of line start offsets.

use serde::{Deserialize, Serialize};

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start position.
    pub start: u32,
    /// Byte offset of the end position (exclusive).
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Zero-length span at a given offset.
    pub fn at(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Span covering both `self` and `other`.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A single source text with line indexing.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original source text.
    pub source: String,
    /// Byte offsets of each line start; `line_starts[0]` is always 0 and the
    /// last entry is an EOF sentinel.
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = compute_line_starts(&source);
        Self {
            source,
            line_starts,
        }
    }

    /// Get the 1-based `(line, column)` for a byte offset.
    ///
    /// Offsets past the end of the source clamp to the final position, so the
    /// synthesized end-of-input span always maps to a real location.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);

        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };
        // The EOF sentinel is not a line of its own.
        let line_idx = line_idx.min(self.line_starts.len().saturating_sub(2));

        let line = (line_idx + 1) as u32;
        let col = (offset - self.line_starts[line_idx]) + 1;
        (line, col)
    }

    /// Get the source snippet covered by a span.
    pub fn snippet(&self, span: &Span) -> &str {
        &self.source[span.start as usize..span.end as usize]
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];
    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }
    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }
    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(10, 20);
        let b = Span::new(15, 30);
        assert_eq!(a.merge(&b), Span::new(10, 30));
    }

    #[test]
    fn test_line_col() {
        let file = SourceFile::new("hello\nworld\n");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(5), (1, 6));
        assert_eq!(file.line_col(6), (2, 1));
        assert_eq!(file.line_col(11), (2, 6));
    }

    #[test]
    fn test_line_col_empty_source() {
        let file = SourceFile::new("");
        assert_eq!(file.line_col(0), (1, 1));
    }

    #[test]
    fn test_line_col_past_eof_clamps() {
        let file = SourceFile::new("abc");
        assert_eq!(file.line_col(99), (1, 4));
    }

    #[test]
    fn test_snippet() {
        let file = SourceFile::new("agent person 10 {}");
        assert_eq!(file.snippet(&Span::new(6, 12)), "person");
    }
}
