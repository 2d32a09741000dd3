// Packing owned annotations into one self-releasing allocation.
//
// Messages, suggestion strings and the per-annotation suggestion pointer
// tables all live in a single boxed `Backing`. The array's context points to
// that box and the release function drops it, which frees the nested
// suggestion arrays along with everything else.

use std::ffi::{CString, NulError, c_void};

use patronus_core::Annotation;

use crate::abi::{AnnotationArray, RawAnnotation, Suggestion, SuggestionArray};
use crate::parray::PArray;

/// A string could not cross the boundary.
#[derive(Debug, thiserror::Error)]
#[error("annotation {index} contains an interior NUL byte")]
pub struct PackError {
    pub index: usize,
    #[source]
    source: NulError,
}

struct Backing {
    annotations: Vec<RawAnnotation>,
    // Kept alive for the pointers stored in `annotations`. Moving the Vecs
    // into the box does not move their heap buffers.
    _messages: Vec<CString>,
    _suggestion_tables: Vec<Vec<Suggestion>>,
    _suggestion_strings: Vec<CString>,
}

unsafe extern "C" fn release_backing(
    _data: *mut RawAnnotation,
    _len: usize,
    context: *mut c_void,
) {
    if !context.is_null() {
        drop(unsafe { Box::from_raw(context as *mut Backing) });
    }
}

/// Build an annotation array that frees itself, nested suggestions included.
///
/// Zero annotations still produce an array with a real release function; the
/// receiver calls it like any other.
pub fn pack_annotations(annotations: Vec<Annotation>) -> Result<AnnotationArray, PackError> {
    let mut messages = Vec::with_capacity(annotations.len());
    let mut tables: Vec<Vec<Suggestion>> = Vec::with_capacity(annotations.len());
    let mut strings = Vec::new();
    let mut raw = Vec::with_capacity(annotations.len());

    for (index, ann) in annotations.into_iter().enumerate() {
        let message =
            CString::new(ann.message).map_err(|source| PackError { index, source })?;

        let mut table = Vec::with_capacity(ann.suggestions.len());
        for suggestion in ann.suggestions {
            let s = CString::new(suggestion).map_err(|source| PackError { index, source })?;
            table.push(s.as_ptr());
            strings.push(s);
        }

        raw.push(RawAnnotation {
            offset: ann.offset,
            length: ann.length,
            message: message.as_ptr(),
            kind: ann.kind.as_u32(),
            suggestions: SuggestionArray::borrowed_from_parent(table.as_mut_ptr(), table.len()),
        });
        messages.push(message);
        tables.push(table);
    }

    let mut backing = Box::new(Backing {
        annotations: raw,
        _messages: messages,
        _suggestion_tables: tables,
        _suggestion_strings: strings,
    });
    let data = backing.annotations.as_mut_ptr();
    let len = backing.annotations.len();

    Ok(PArray {
        data,
        len,
        context: Box::into_raw(backing) as *mut c_void,
        release: Some(release_backing),
    })
}
