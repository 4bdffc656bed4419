//! Byte spans into class-file text

use std::fmt::{self, Display, Formatter};

/// Half-open byte range `[start, end)` into a source string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize)]
pub struct Span {
    /// First byte of the range
    pub start: usize,
    /// One past the last byte of the range
    pub end: usize,
}

impl Span {
    /// Create span from offsets
    #[inline]
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at an offset (an insertion point)
    #[inline]
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Length in bytes
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` lies within the span
    #[inline]
    #[must_use]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Text covered by the span
    ///
    /// Returns an empty string if the span is out of bounds.
    #[inline]
    #[must_use]
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// 1-based line number of a byte offset
#[must_use]
pub fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_len() {
        let src = "abcdef";
        let span = Span::new(1, 4);
        assert_eq!(span.slice(src), "bcd");
        assert_eq!(span.len(), 3);
        assert!(span.contains(3));
        assert!(!span.contains(4));
    }

    #[test]
    fn out_of_bounds_slice_is_empty() {
        assert_eq!(Span::new(4, 40).slice("abc"), "");
    }

    #[test]
    fn line_numbers() {
        let src = "a\nb\nc";
        assert_eq!(line_of(src, 0), 1);
        assert_eq!(line_of(src, 2), 2);
        assert_eq!(line_of(src, 4), 3);
    }
}
