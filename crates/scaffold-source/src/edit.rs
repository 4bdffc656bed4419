//! Byte-span edits on class-file text
//!
//! Every structural operation of the [`Mutator`](crate::Mutator) lowers to a
//! single [`Edit`]: replace the bytes of one span with new text. Edits carry
//! the hash of the text they were computed for; applying one to any other
//! text is refused.

use crate::hash::ContentHash;
use crate::span::Span;

/// Verified byte-span replacement
///
/// # Invariants
/// - `base_hash` must match the text being edited
/// - `span` must lie on `char` boundaries of that text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Range being replaced (zero-width for insertions)
    span: Span,

    /// Replacement text
    text: String,

    /// Hash of the text this edit was computed against
    base_hash: ContentHash,

    /// Human-readable description
    description: String,
}

impl Edit {
    /// Insert `text` at `offset`
    #[inline]
    #[must_use]
    pub fn insert(
        offset: usize,
        text: impl Into<String>,
        base_hash: ContentHash,
        description: impl Into<String>,
    ) -> Self {
        Self::replace(Span::at(offset), text, base_hash, description)
    }

    /// Replace the bytes of `span` with `text`
    #[inline]
    #[must_use]
    pub fn replace(
        span: Span,
        text: impl Into<String>,
        base_hash: ContentHash,
        description: impl Into<String>,
    ) -> Self {
        Self {
            span,
            text: text.into(),
            base_hash,
            description: description.into(),
        }
    }

    /// Target span
    #[inline]
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Replacement text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Base hash
    #[inline]
    #[must_use]
    pub fn base_hash(&self) -> &ContentHash {
        &self.base_hash
    }

    /// Description
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether this edit only inserts text
    #[inline]
    #[must_use]
    pub fn is_insertion(&self) -> bool {
        self.span.is_empty()
    }

    /// Verify the edit was computed for `source`
    ///
    /// # Errors
    /// Returns error if the base hash or the span does not fit `source`
    pub fn validate(&self, source: &str) -> Result<(), EditError> {
        let actual = ContentHash::of_text(source);
        if actual != self.base_hash {
            return Err(EditError::BaseMismatch {
                expected: self.base_hash,
                actual,
            });
        }
        if self.span.start > self.span.end || self.span.end > source.len() {
            return Err(EditError::OutOfBounds {
                span: self.span,
                len: source.len(),
            });
        }
        if !source.is_char_boundary(self.span.start) || !source.is_char_boundary(self.span.end) {
            return Err(EditError::NotCharBoundary(self.span));
        }
        Ok(())
    }

    /// Apply the edit, producing the new text
    ///
    /// # Errors
    /// Returns error if validation fails
    pub fn apply(&self, source: &str) -> Result<String, EditError> {
        self.validate(source)?;
        let mut out =
            String::with_capacity(source.len() - self.span.len() + self.text.len());
        out.push_str(&source[..self.span.start]);
        out.push_str(&self.text);
        out.push_str(&source[self.span.end..]);
        Ok(out)
    }
}

/// Errors applying an [`Edit`]
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// Edit was computed against different text
    #[error("base hash mismatch: expected {expected}, got {actual}")]
    BaseMismatch {
        /// Hash recorded in the edit
        expected: ContentHash,
        /// Hash of the text the edit was applied to
        actual: ContentHash,
    },

    /// Span does not fit the text
    #[error("span {span} out of bounds for text of {len} bytes")]
    OutOfBounds {
        /// Offending span
        span: Span,
        /// Length of the text
        len: usize,
    },

    /// Span splits a UTF-8 sequence
    #[error("span {0} does not lie on character boundaries")]
    NotCharBoundary(Span),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_surroundings() {
        let src = "abc";
        let edit = Edit::insert(1, "XY", ContentHash::of_text(src), "test");
        assert_eq!(edit.apply(src).unwrap(), "aXYbc");
        assert!(edit.is_insertion());
    }

    #[test]
    fn replace_span() {
        let src = "private $a;";
        let edit = Edit::replace(Span::new(8, 10), "$b", ContentHash::of_text(src), "rename");
        assert_eq!(edit.apply(src).unwrap(), "private $b;");
    }

    #[test]
    fn stale_base_is_refused() {
        let edit = Edit::insert(0, "x", ContentHash::of_text("old"), "stale");
        assert!(matches!(
            edit.apply("new"),
            Err(EditError::BaseMismatch { .. })
        ));
    }

    #[test]
    fn out_of_bounds_is_refused() {
        let src = "abc";
        let edit = Edit::insert(10, "x", ContentHash::of_text(src), "far");
        assert!(matches!(edit.apply(src), Err(EditError::OutOfBounds { .. })));
    }

    #[test]
    fn char_boundary_is_checked() {
        let src = "é";
        let edit = Edit::insert(1, "x", ContentHash::of_text(src), "split");
        assert!(matches!(edit.apply(src), Err(EditError::NotCharBoundary(_))));
    }
}
