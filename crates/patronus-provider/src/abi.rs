// C-compatible structures exchanged between the host and providers.
//
// Layout rules:
// - All strings are UTF-8, NUL-terminated, owned by whoever owns the
//   enclosing array.
// - The checked text is passed as (pointer, byte length) and is borrowed for
//   the duration of the `check` call only.
// - `kind` travels as a raw u32 so the host can reject unknown values.

use std::ffi::{c_char, c_int, c_void};

use crate::parray::PArray;

/// Suggestion string.
pub type Suggestion = *const c_char;
/// Array of suggestions, owned by the annotation that embeds it.
pub type SuggestionArray = PArray<Suggestion>;
/// Array of annotations returned by a check.
pub type AnnotationArray = PArray<RawAnnotation>;

/// One finding as laid out on the boundary.
#[derive(Debug)]
#[repr(C)]
pub struct RawAnnotation {
    pub offset: usize,
    pub length: usize,
    /// Valid while the enclosing array is alive.
    pub message: *const c_char,
    /// An `AnnotationKind` value.
    pub kind: u32,
    /// Released together with the enclosing array, never on its own.
    pub suggestions: SuggestionArray,
}

/// Check parameters as laid out on the boundary.
#[derive(Debug)]
#[repr(C)]
pub struct RawProperties {
    pub primary_language: *const c_char,
}

/// Returns the provider's display name. Must be pure and stable.
pub type NameFn = unsafe extern "C" fn() -> *const c_char;

/// Checks `text_len` bytes at `text`.
///
/// On `STATUS_OK` the provider has written a fresh array to `out`; on any
/// other status `out` is left untouched and nothing needs releasing.
pub type CheckFn = unsafe extern "C" fn(
    props: *const RawProperties,
    text: *const u8,
    text_len: usize,
    context: *mut c_void,
    out: *mut AnnotationArray,
) -> c_int;

/// Provider-level release of an array it produced.
pub type FreeAnnotationsFn = unsafe extern "C" fn(annotations: *mut AnnotationArray);

/// Releases provider-level resources behind `context`.
pub type FreeProviderFn = unsafe extern "C" fn(context: *mut c_void);

/// The function table a provider hands to the host.
///
/// `context` is opaque to the host and passed back unchanged on every call.
#[derive(Debug)]
#[repr(C)]
pub struct RawProvider {
    pub name: NameFn,
    pub check: CheckFn,
    pub free_annotations: FreeAnnotationsFn,
    pub free_provider: Option<FreeProviderFn>,
    /// Bit set of `PROVIDER_FLAG_*` values.
    pub flags: u32,
    pub context: *mut c_void,
}

impl RawProvider {
    pub fn is_concurrent(&self) -> bool {
        self.flags & crate::PROVIDER_FLAG_CONCURRENT != 0
    }
}

/// Generic `free_annotations`: release `*annotations` through its embedded
/// capability and leave an empty array in its place.
///
/// Providers that build their arrays with this crate use it as their
/// provider-level free, so both release paths are the same function.
///
/// # Safety
///
/// `annotations` must be NULL or point to an array produced by a provider and
/// not yet released.
pub unsafe extern "C" fn free_annotations(annotations: *mut AnnotationArray) {
    if annotations.is_null() {
        return;
    }
    let arr = unsafe { std::ptr::replace(annotations, PArray::empty()) };
    unsafe { arr.release() };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack_annotations;
    use patronus_core::{Annotation, AnnotationKind};

    #[test]
    fn free_annotations_leaves_empty_array() {
        let mut arr = pack_annotations(vec![Annotation::new(
            0,
            1,
            "m",
            AnnotationKind::Style,
        )])
        .unwrap();
        unsafe { free_annotations(&mut arr) };
        assert_eq!(arr.len, 0);
        assert!(arr.data.is_null());
    }

    #[test]
    fn free_annotations_accepts_null() {
        unsafe { free_annotations(std::ptr::null_mut()) };
    }
}
