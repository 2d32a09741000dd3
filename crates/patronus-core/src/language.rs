// Language tag helpers
//
// Providers receive tags in whatever form the caller uses (`en`, `en_US`,
// `en-GB`). Most only care about the primary subtag.

/// The primary subtag of a language tag, lowercased.
///
/// ```
/// use patronus_core::language::primary_subtag;
/// assert_eq!(primary_subtag("en_US"), "en");
/// assert_eq!(primary_subtag("CS-cz"), "cs");
/// ```
pub fn primary_subtag(tag: &str) -> String {
    tag.split(['_', '-'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether `tag` names the language `primary` (case-insensitive, region ignored).
pub fn is_language(tag: &str, primary: &str) -> bool {
    primary_subtag(tag) == primary.to_ascii_lowercase()
}
