// Host-side ownership of provider-allocated annotation arrays.
//
// An `AnnotationArray` is created only after the raw array has passed
// validation, so the accessors below can hand out plain `&str`s. The guard
// calls the array's embedded release function exactly once, on drop, under
// the provider's call lock when its context is single-writer.

use std::ffi::{CStr, c_char};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use patronus_core::{Annotation, AnnotationKind, CheckError};
use patronus_provider::{PArray, RawAnnotation};

/// Validated annotation array owned by the caller.
///
/// The lifetime ties the array to the provider that produced it: the
/// provider (and the library holding the release code) cannot be torn down
/// while any of its arrays is alive.
pub struct AnnotationArray<'p> {
    raw: PArray<RawAnnotation>,
    provider: &'p str,
    release_lock: Option<&'p Mutex<()>>,
    _owner: PhantomData<&'p ()>,
}

// The exchange contract requires array contents to be immutable after
// `check` returns and release functions to be callable from any thread.
unsafe impl Send for AnnotationArray<'_> {}
unsafe impl Sync for AnnotationArray<'_> {}

impl<'p> AnnotationArray<'p> {
    /// Take ownership of `raw` after checking it against a text of
    /// `text_len` bytes.
    ///
    /// On a violation the array is released before the error is returned,
    /// unless it has no release function, in which case it is leaked.
    /// `release_lock` is held around every release; the caller must not
    /// hold it already.
    ///
    /// # Safety
    ///
    /// `raw` must be a fresh, unreleased array produced by provider
    /// `provider`, with `len` readable elements behind `data`.
    pub(crate) unsafe fn validate(
        raw: PArray<RawAnnotation>,
        text_len: usize,
        provider: &'p str,
        release_lock: Option<&'p Mutex<()>>,
    ) -> Result<Self, CheckError> {
        if !raw.has_release() {
            tracing::warn!(provider, len = raw.len, "array without release function leaked");
            return Err(CheckError::violation(provider, "array has no release function"));
        }
        let array = AnnotationArray {
            raw,
            provider,
            release_lock,
            _owner: PhantomData,
        };
        array.check_contents(text_len)?;
        Ok(array)
    }

    fn check_contents(&self, text_len: usize) -> Result<(), CheckError> {
        let violation = |detail: String| CheckError::violation(self.provider, detail);

        if self.raw.data.is_null() && self.raw.len != 0 {
            return Err(violation(format!("NULL data with length {}", self.raw.len)));
        }
        for (i, ann) in unsafe { self.raw.as_slice() }.iter().enumerate() {
            if AnnotationKind::from_u32(ann.kind).is_none() {
                return Err(violation(format!("annotation {i} has unknown kind {}", ann.kind)));
            }
            match ann.offset.checked_add(ann.length) {
                Some(end) if end <= text_len => {}
                _ => {
                    return Err(violation(format!(
                        "annotation {i} spans {}+{}, text has {text_len} bytes",
                        ann.offset, ann.length
                    )));
                }
            }
            if unsafe { read_str(ann.message) }.is_none() {
                return Err(violation(format!("annotation {i} has an invalid message")));
            }
            let suggestions = &ann.suggestions;
            if suggestions.data.is_null() && suggestions.len != 0 {
                return Err(violation(format!("annotation {i} has NULL suggestions")));
            }
            for (j, s) in unsafe { suggestions.as_slice() }.iter().enumerate() {
                if unsafe { read_str(*s) }.is_none() {
                    return Err(violation(format!("annotation {i} suggestion {j} is invalid")));
                }
            }
        }
        Ok(())
    }

    /// Name of the provider that produced this array.
    pub fn provider(&self) -> &'p str {
        self.provider
    }

    pub fn len(&self) -> usize {
        self.raw.len
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    pub fn get(&self, index: usize) -> Option<AnnotationRef<'_>> {
        self.raw_items().get(index).map(AnnotationRef::new)
    }

    /// Annotations in the provider's order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = AnnotationRef<'_>> + '_ {
        self.raw_items().iter().map(AnnotationRef::new)
    }

    /// Copy every annotation out of the provider's storage.
    pub fn to_annotations(&self) -> Vec<Annotation> {
        self.iter().map(|a| a.to_annotation()).collect()
    }

    /// Release now. Equivalent to dropping the array.
    pub fn release(self) {
        drop(self);
    }

    fn raw_items(&self) -> &[RawAnnotation] {
        unsafe { self.raw.as_slice() }
    }
}

impl Drop for AnnotationArray<'_> {
    fn drop(&mut self) {
        let raw = std::mem::replace(&mut self.raw, PArray::empty());
        tracing::trace!(provider = self.provider, len = raw.len, "releasing annotations");
        let _guard = self
            .release_lock
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner));
        unsafe { raw.release() };
    }
}

impl fmt::Debug for AnnotationArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationArray")
            .field("provider", &self.provider)
            .field("annotations", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> IntoIterator for &'a AnnotationArray<'_> {
    type Item = AnnotationRef<'a>;
    type IntoIter =
        std::iter::Map<std::slice::Iter<'a, RawAnnotation>, fn(&'a RawAnnotation) -> AnnotationRef<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.raw_items()
            .iter()
            .map(AnnotationRef::new as fn(&'a RawAnnotation) -> AnnotationRef<'a>)
    }
}

/// Borrowed view of one annotation, valid while its array is alive.
#[derive(Clone, Copy)]
pub struct AnnotationRef<'a> {
    raw: &'a RawAnnotation,
}

impl<'a> AnnotationRef<'a> {
    fn new(raw: &'a RawAnnotation) -> Self {
        Self { raw }
    }

    pub fn offset(&self) -> usize {
        self.raw.offset
    }

    pub fn length(&self) -> usize {
        self.raw.length
    }

    /// Exclusive end offset. Validation guarantees it does not overflow.
    pub fn end(&self) -> usize {
        self.raw.offset + self.raw.length
    }

    pub fn kind(&self) -> AnnotationKind {
        // Unknown kinds are rejected by validation.
        AnnotationKind::from_u32(self.raw.kind).unwrap_or(AnnotationKind::Suggestion)
    }

    pub fn message(&self) -> &'a str {
        unsafe { read_str(self.raw.message) }.unwrap_or_default()
    }

    pub fn suggestions(&self) -> impl ExactSizeIterator<Item = &'a str> + 'a {
        let items: &'a [*const c_char] = unsafe { self.raw.suggestions.as_slice() };
        items
            .iter()
            .map(|s| unsafe { read_str(*s) }.unwrap_or_default())
    }

    pub fn to_annotation(&self) -> Annotation {
        Annotation::with_suggestions(
            self.offset(),
            self.length(),
            self.message(),
            self.kind(),
            self.suggestions(),
        )
    }
}

impl fmt::Debug for AnnotationRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationRef")
            .field("offset", &self.offset())
            .field("length", &self.length())
            .field("kind", &self.kind())
            .field("message", &self.message())
            .field("suggestions", &self.suggestions().collect::<Vec<_>>())
            .finish()
    }
}

impl PartialEq<Annotation> for AnnotationRef<'_> {
    fn eq(&self, other: &Annotation) -> bool {
        self.offset() == other.offset
            && self.length() == other.length
            && self.kind() == other.kind
            && self.message() == other.message
            && self.suggestions().eq(other.suggestions.iter().map(String::as_str))
    }
}

/// Read a NUL-terminated UTF-8 string, `None` if NULL or not UTF-8.
unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use patronus_provider::pack_annotations;
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn packed(anns: Vec<Annotation>) -> PArray<RawAnnotation> {
        pack_annotations(anns).unwrap()
    }

    #[test]
    fn valid_array_is_accepted() {
        let raw = packed(vec![Annotation::with_suggestions(
            0,
            3,
            "Did you mean 'You'?",
            AnnotationKind::Spelling,
            ["You"],
        )]);
        let arr = unsafe { AnnotationArray::validate(raw, 18, "test", None) }.unwrap();
        assert_eq!(arr.len(), 1);
        let ann = arr.get(0).unwrap();
        assert_eq!(ann.message(), "Did you mean 'You'?");
        assert_eq!(ann.suggestions().collect::<Vec<_>>(), vec!["You"]);
        assert_eq!(ann.kind(), AnnotationKind::Spelling);
    }

    #[test]
    fn out_of_bounds_is_violation() {
        let raw = packed(vec![Annotation::new(5, 10, "x", AnnotationKind::Grammar)]);
        let err = unsafe { AnnotationArray::validate(raw, 12, "test", None) }.unwrap_err();
        assert!(matches!(err, CheckError::ProtocolViolation { .. }));
    }

    #[test]
    fn range_ending_at_text_end_is_fine() {
        let raw = packed(vec![Annotation::new(5, 7, "x", AnnotationKind::Grammar)]);
        assert!(unsafe { AnnotationArray::validate(raw, 12, "test", None) }.is_ok());
    }

    #[test]
    fn unknown_kind_is_violation() {
        let raw = packed(vec![Annotation::new(0, 1, "x", AnnotationKind::Style)]);
        unsafe { (*raw.data).kind = 9 };
        let err = unsafe { AnnotationArray::validate(raw, 1, "test", None) }.unwrap_err();
        assert!(err.to_string().contains("unknown kind 9"));
    }

    #[test]
    fn null_message_is_violation() {
        let raw = packed(vec![Annotation::new(0, 1, "x", AnnotationKind::Style)]);
        unsafe { (*raw.data).message = std::ptr::null() };
        assert!(unsafe { AnnotationArray::validate(raw, 1, "test", None) }.is_err());
    }

    static RELEASED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn counting_release(_: *mut RawAnnotation, _: usize, _: *mut c_void) {
        RELEASED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn rejected_array_is_released_once() {
        let before = RELEASED.load(Ordering::SeqCst);
        let mut items = vec![RawAnnotation {
            offset: 0,
            length: 99,
            message: c"x".as_ptr(),
            kind: 1,
            suggestions: PArray::empty(),
        }];
        let raw = PArray {
            data: items.as_mut_ptr(),
            len: items.len(),
            context: std::ptr::null_mut(),
            release: Some(counting_release),
        };
        assert!(unsafe { AnnotationArray::validate(raw, 3, "test", None) }.is_err());
        assert_eq!(RELEASED.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn missing_release_is_violation() {
        let raw: PArray<RawAnnotation> = PArray {
            data: std::ptr::null_mut(),
            len: 0,
            context: std::ptr::null_mut(),
            release: None,
        };
        let err = unsafe { AnnotationArray::validate(raw, 0, "test", None) }.unwrap_err();
        assert!(err.to_string().contains("no release function"));
    }

    #[test]
    fn ref_compares_with_owned() {
        let owned = Annotation::with_suggestions(1, 2, "m", AnnotationKind::Typography, ["a", "b"]);
        let raw = packed(vec![owned.clone()]);
        let arr = unsafe { AnnotationArray::validate(raw, 3, "test", None) }.unwrap();
        assert_eq!(arr.get(0).unwrap(), owned);
        assert_eq!(arr.to_annotations(), vec![owned]);
    }
}
