// Annotation classification shared across the provider boundary.
//
// The numeric values are part of the ABI: providers built against older
// headers hardcode them, so a value is never renumbered or reused.

use std::fmt;

/// Classification of a single annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum AnnotationKind {
    /// Misspelled word.
    Spelling = 1,
    /// Grammatical error.
    Grammar = 2,
    /// Stylistic remark.
    Style = 3,
    /// Typographic issue (quotes, dashes, spacing).
    Typography = 4,
    /// Optional improvement that is not an error.
    Suggestion = 5,
}

impl AnnotationKind {
    /// All kinds in numeric order.
    pub const ALL: [AnnotationKind; 5] = [
        AnnotationKind::Spelling,
        AnnotationKind::Grammar,
        AnnotationKind::Style,
        AnnotationKind::Typography,
        AnnotationKind::Suggestion,
    ];

    /// The stable numeric value used on the C boundary.
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Decode a raw value received from a provider.
    ///
    /// Returns `None` for values outside the known range instead of
    /// trusting foreign code to stay within the enum.
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(AnnotationKind::Spelling),
            2 => Some(AnnotationKind::Grammar),
            3 => Some(AnnotationKind::Style),
            4 => Some(AnnotationKind::Typography),
            5 => Some(AnnotationKind::Suggestion),
            _ => None,
        }
    }

    /// Lowercase name, used by the CLI output formats.
    pub const fn name(self) -> &'static str {
        match self {
            AnnotationKind::Spelling => "spelling",
            AnnotationKind::Grammar => "grammar",
            AnnotationKind::Style => "style",
            AnnotationKind::Typography => "typography",
            AnnotationKind::Suggestion => "suggestion",
        }
    }
}

impl TryFrom<u32> for AnnotationKind {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value).ok_or(value)
    }
}

impl From<AnnotationKind> for u32 {
    fn from(kind: AnnotationKind) -> u32 {
        kind.as_u32()
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_are_stable() {
        assert_eq!(AnnotationKind::Spelling as u32, 1);
        assert_eq!(AnnotationKind::Grammar as u32, 2);
        assert_eq!(AnnotationKind::Style as u32, 3);
        assert_eq!(AnnotationKind::Typography as u32, 4);
        assert_eq!(AnnotationKind::Suggestion as u32, 5);
    }

    #[test]
    fn style_is_three_in_every_direction() {
        assert_eq!(AnnotationKind::Style.as_u32(), 3);
        assert_eq!(u32::from(AnnotationKind::Style), 3);
        assert_eq!(AnnotationKind::from_u32(3), Some(AnnotationKind::Style));
        assert_eq!(AnnotationKind::try_from(3), Ok(AnnotationKind::Style));
    }

    #[test]
    fn decode_round_trips_all_kinds() {
        for kind in AnnotationKind::ALL {
            assert_eq!(AnnotationKind::from_u32(kind.as_u32()), Some(kind));
        }
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert_eq!(AnnotationKind::from_u32(0), None);
        assert_eq!(AnnotationKind::from_u32(6), None);
        assert_eq!(AnnotationKind::try_from(u32::MAX), Err(u32::MAX));
    }

    #[test]
    fn display_uses_lowercase_name() {
        assert_eq!(AnnotationKind::Typography.to_string(), "typography");
    }
}
