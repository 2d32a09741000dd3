// Writing providers in Rust.
//
// Implement `Check` and turn the value into a `RawProvider` with
// `RawProvider::from_check`. The generated trampolines decode the boundary
// arguments, catch panics, and pack the result with `pack_annotations`.

use std::ffi::{CStr, c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::slice;

use patronus_core::{Annotation, Properties};

use crate::abi::{self, AnnotationArray, RawProperties, RawProvider};
use crate::pack::pack_annotations;
use crate::{PROVIDER_FLAG_CONCURRENT, STATUS_INVALID_INPUT, STATUS_OK, STATUS_PROVIDER_FAULT};

/// Why a provider declined to produce annotations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// The input does not meet the provider's preconditions.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The provider cannot do its job.
    #[error("provider fault: {0}")]
    Fault(String),
}

impl Failure {
    pub fn status(&self) -> c_int {
        match self {
            Failure::InvalidInput(_) => STATUS_INVALID_INPUT,
            Failure::Fault(_) => STATUS_PROVIDER_FAULT,
        }
    }
}

/// A checker implemented in Rust.
///
/// `check` takes `&self`, so a `Check` value is safe to call concurrently
/// and the resulting provider advertises `PROVIDER_FLAG_CONCURRENT`. Use
/// interior mutability for caches.
pub trait Check: Send + Sync + 'static {
    /// Display name returned by the provider's `name` function.
    const NAME: &'static CStr;

    /// Check `text` and return findings with byte offsets into it.
    fn check(&self, props: &Properties, text: &str) -> Result<Vec<Annotation>, Failure>;
}

unsafe extern "C" fn name_trampoline<C: Check>() -> *const c_char {
    C::NAME.as_ptr()
}

unsafe extern "C" fn check_trampoline<C: Check>(
    props: *const RawProperties,
    text: *const u8,
    text_len: usize,
    context: *mut c_void,
    out: *mut AnnotationArray,
) -> c_int {
    if context.is_null() || out.is_null() {
        return STATUS_PROVIDER_FAULT;
    }
    let Some(props) = (unsafe { props.as_ref() }) else {
        return STATUS_INVALID_INPUT;
    };
    if props.primary_language.is_null() {
        return STATUS_INVALID_INPUT;
    }
    let Ok(language) = unsafe { CStr::from_ptr(props.primary_language) }.to_str() else {
        return STATUS_INVALID_INPUT;
    };
    let bytes = if text_len == 0 {
        &[][..]
    } else if text.is_null() {
        return STATUS_INVALID_INPUT;
    } else {
        unsafe { slice::from_raw_parts(text, text_len) }
    };
    let Ok(text) = std::str::from_utf8(bytes) else {
        return STATUS_INVALID_INPUT;
    };

    let checker = unsafe { &*(context as *const C) };
    let props = Properties::new(language);

    match panic::catch_unwind(AssertUnwindSafe(|| checker.check(&props, text))) {
        Ok(Ok(annotations)) => match pack_annotations(annotations) {
            Ok(arr) => {
                unsafe { out.write(arr) };
                STATUS_OK
            }
            Err(e) => {
                tracing::debug!(provider = ?C::NAME, "cannot pack annotations: {e}");
                STATUS_PROVIDER_FAULT
            }
        },
        Ok(Err(failure)) => {
            tracing::debug!(provider = ?C::NAME, "check failed: {failure}");
            failure.status()
        }
        Err(_) => {
            tracing::debug!(provider = ?C::NAME, "check panicked");
            STATUS_PROVIDER_FAULT
        }
    }
}

unsafe extern "C" fn free_provider_trampoline<C: Check>(context: *mut c_void) {
    if !context.is_null() {
        let checker = unsafe { Box::from_raw(context as *mut C) };
        // A panicking destructor must not unwind into foreign code.
        let _ = panic::catch_unwind(AssertUnwindSafe(move || drop(checker)));
    }
}

impl RawProvider {
    /// Build the function table for a Rust checker. The checker is boxed and
    /// becomes the context; `free_provider` drops it.
    pub fn from_check<C: Check>(checker: C) -> Self {
        RawProvider {
            name: name_trampoline::<C>,
            check: check_trampoline::<C>,
            free_annotations: abi::free_annotations,
            free_provider: Some(free_provider_trampoline::<C>),
            flags: PROVIDER_FLAG_CONCURRENT,
            context: Box::into_raw(Box::new(checker)) as *mut c_void,
        }
    }
}

/// Body of an exported `patronus_provider_init`: construct the checker and
/// write its function table to `out`.
///
/// Returns `STATUS_PROVIDER_FAULT` when construction fails or panics.
///
/// # Safety
///
/// `out` must be NULL or valid for writing one `RawProvider`.
pub unsafe fn init_into<C, F>(out: *mut RawProvider, make: F) -> c_int
where
    C: Check,
    F: FnOnce() -> Result<C, Failure>,
{
    if out.is_null() {
        return STATUS_PROVIDER_FAULT;
    }
    match panic::catch_unwind(AssertUnwindSafe(make)) {
        Ok(Ok(checker)) => {
            unsafe { out.write(RawProvider::from_check(checker)) };
            STATUS_OK
        }
        Ok(Err(failure)) => {
            tracing::debug!(provider = ?C::NAME, "initialization failed: {failure}");
            failure.status()
        }
        Err(_) => STATUS_PROVIDER_FAULT,
    }
}
