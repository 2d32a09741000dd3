//! Sample provider.
//!
//! Flags every occurrence of "mistakes are good" in English text. Any other
//! language gets an empty result. Built as a `cdylib` it can be dropped into
//! a provider directory; as an `rlib` it can be registered in-process.

use std::ffi::CStr;

use patronus_core::language::is_language;
use patronus_provider::{Annotation, AnnotationKind, Check, Failure, Properties, export_provider};

const PHRASE: &str = "mistakes are good";
const MESSAGE: &str = "Are you sure about mistakes being good?";
const SUGGESTIONS: [&str; 2] = ["mistakes are never good", "mistakes are bad"];

/// The sample checker.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sample;

impl Sample {
    fn check_english(text: &str) -> Vec<Annotation> {
        text.match_indices(PHRASE)
            .map(|(offset, found)| {
                Annotation::with_suggestions(
                    offset,
                    found.len(),
                    MESSAGE,
                    AnnotationKind::Suggestion,
                    SUGGESTIONS,
                )
            })
            .collect()
    }
}

impl Check for Sample {
    const NAME: &'static CStr = c"Sample checker";

    fn check(&self, props: &Properties, text: &str) -> Result<Vec<Annotation>, Failure> {
        if is_language(&props.primary_language, "en") {
            Ok(Self::check_english(text))
        } else {
            Ok(Vec::new())
        }
    }
}

export_provider!(Ok(Sample));
