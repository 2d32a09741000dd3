// Owned annotation and check properties
//
// `Annotation` is the caller-side copy of a provider finding. Offsets are
// byte offsets into the checked text, and the range is half-open.

use crate::kind::AnnotationKind;

/// A single finding reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Byte offset of the first byte covered by the finding.
    pub offset: usize,

    /// Number of bytes covered. Zero marks an insertion point at `offset`.
    pub length: usize,

    /// Human-readable description.
    pub message: String,

    /// Classification.
    pub kind: AnnotationKind,

    /// Replacement candidates, best first.
    pub suggestions: Vec<String>,
}

impl Annotation {
    /// Create an annotation with no suggestions.
    pub fn new(
        offset: usize,
        length: usize,
        message: impl Into<String>,
        kind: AnnotationKind,
    ) -> Self {
        Self {
            offset,
            length,
            message: message.into(),
            kind,
            suggestions: Vec::new(),
        }
    }

    /// Create an annotation with suggestions.
    pub fn with_suggestions<I, S>(
        offset: usize,
        length: usize,
        message: impl Into<String>,
        kind: AnnotationKind,
        suggestions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            offset,
            length,
            message: message.into(),
            kind,
            suggestions: suggestions.into_iter().map(Into::into).collect(),
        }
    }

    /// Exclusive end offset, or `None` when `offset + length` overflows.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }

    /// Whether this annotation marks a position rather than a span.
    pub fn is_insertion(&self) -> bool {
        self.length == 0
    }

    /// Whether the range lies inside a text of `text_len` bytes.
    pub fn fits(&self, text_len: usize) -> bool {
        self.end().is_some_and(|end| end <= text_len)
    }

    /// The covered slice of `text`, if the range is in bounds and lands on
    /// character boundaries.
    pub fn covered<'t>(&self, text: &'t str) -> Option<&'t str> {
        text.get(self.offset..self.end()?)
    }
}

/// Parameters passed to every provider alongside the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Properties {
    /// Language tag such as `en`, `en_US` or `cs-CZ`.
    pub primary_language: String,
}

impl Properties {
    pub fn new(primary_language: impl Into<String>) -> Self {
        Self {
            primary_language: primary_language.into(),
        }
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self::new("en")
    }
}
