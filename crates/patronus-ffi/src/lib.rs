// FFI functions are inherently unsafe; callers must ensure pointer validity.
// Safety contracts are documented per-function in the public API comments.
#![allow(clippy::missing_safety_doc)]

// patronus-ffi: C-compatible API over the Patronus checker host.
//
// Memory management rules:
// - Opaque `PatronusChecker` pointer: created by `patronus_new`, freed by
//   `patronus_free`.
// - Annotation arrays written by `patronus_check` carry their own release
//   function; free them with `patronus_release_annotations`.
// - Returned strings: caller must free with `patronus_free_str`.
// - Text is passed as (pointer, length) UTF-8 bytes; other strings are
//   UTF-8, NUL-terminated.

use std::ffi::{CStr, CString, c_char, c_int};
use std::path::Path;
use std::ptr;
use std::slice;

use patronus::{Checker, Config, Properties};
use patronus_provider::{
    AnnotationArray, PArray, RawProperties, STATUS_INVALID_INPUT, STATUS_OK,
    STATUS_PROVIDER_FAULT, pack_annotations,
};

/// Opaque checker handle.
pub struct PatronusChecker {
    checker: Checker,
    config: Config,
}

impl PatronusChecker {
    pub fn new(checker: Checker, config: Config) -> Self {
        Self { checker, config }
    }
}

// ── Checker lifecycle ───────────────────────────────────────────

/// Create a checker and load every provider the configuration points at.
///
/// - `config_path`: TOML config file, or NULL to search the default
///   locations.
///
/// Returns an opaque pointer on success, NULL on failure.
/// On failure, if `error_out` is non-NULL, it receives a heap-allocated error
/// string that the caller must free with `patronus_free_str`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn patronus_new(
    config_path: *const c_char,
    error_out: *mut *mut c_char,
) -> *mut PatronusChecker {
    let explicit = if config_path.is_null() {
        None
    } else {
        match cstr_to_str(config_path) {
            Some(path) => Some(Path::new(path)),
            None => {
                set_error(error_out, "config_path is not valid UTF-8");
                return ptr::null_mut();
            }
        }
    };

    match Config::load(explicit) {
        Ok(config) => {
            let checker = Checker::from_config(&config);
            Box::into_raw(Box::new(PatronusChecker::new(checker, config)))
        }
        Err(e) => {
            set_error(error_out, &e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a checker created by `patronus_new`, unloading its providers.
///
/// Arrays from `patronus_check` stay valid: they are owned by the host, not
/// by any provider.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn patronus_free(checker: *mut PatronusChecker) {
    if !checker.is_null() {
        drop(unsafe { Box::from_raw(checker) });
    }
}

// ── Checking ────────────────────────────────────────────────────

/// Check `text` with every loaded provider.
///
/// - `props`: properties, or NULL for the configured language.
/// - `text` + `text_len`: UTF-8 text (NULL is allowed when `text_len` is 0).
/// - `out`: receives the merged annotations in provider registration order.
/// - `failed_out`: if non-NULL, receives the number of providers that failed
///   (rejected the input, faulted, or returned an invalid array).
///
/// Returns 0 on success, 1 when an argument is invalid, 2 when the result
/// could not be built. Providers that fail are left out of the result.
/// On success the array in `out` must be released with
/// `patronus_release_annotations`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn patronus_check(
    checker: *const PatronusChecker,
    props: *const RawProperties,
    text: *const u8,
    text_len: usize,
    out: *mut AnnotationArray,
    failed_out: *mut usize,
) -> c_int {
    let Some(handle) = (unsafe { checker.as_ref() }) else {
        return STATUS_INVALID_INPUT;
    };
    if out.is_null() {
        return STATUS_INVALID_INPUT;
    }

    let props = match unsafe { props.as_ref() } {
        None => handle.config.properties(),
        Some(raw) => match cstr_to_str(raw.primary_language) {
            Some(language) => Properties::new(language),
            None => return STATUS_INVALID_INPUT,
        },
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

    let report = if handle.config.parallel {
        handle.checker.check_parallel(&props, text)
    } else {
        handle.checker.check(&props, text)
    };
    let mut failed = 0;
    for failure in report.failures() {
        tracing::debug!("{failure}");
        failed += 1;
    }
    if !failed_out.is_null() {
        unsafe { failed_out.write(failed) };
    }

    match pack_annotations(report.to_annotations()) {
        Ok(arr) => {
            unsafe { out.write(arr) };
            STATUS_OK
        }
        Err(e) => {
            tracing::warn!("{e}");
            STATUS_PROVIDER_FAULT
        }
    }
}

/// Release an array written by `patronus_check` and reset it to empty.
///
/// Releasing the emptied array again is harmless.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn patronus_release_annotations(annotations: *mut AnnotationArray) {
    if annotations.is_null() {
        return;
    }
    let arr = unsafe { ptr::replace(annotations, PArray::empty()) };
    unsafe { arr.release() };
}

// ── Introspection ───────────────────────────────────────────────

/// Number of registered providers, or 0 for a NULL checker.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn patronus_provider_count(checker: *const PatronusChecker) -> usize {
    unsafe { checker.as_ref() }.map_or(0, |h| h.checker.len())
}

/// Name of the provider at `index` in registration order.
///
/// Returns a heap-allocated C string. Caller must free with
/// `patronus_free_str`. Returns NULL when `index` is out of range.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn patronus_provider_name(
    checker: *const PatronusChecker,
    index: usize,
) -> *mut c_char {
    let Some(handle) = (unsafe { checker.as_ref() }) else {
        return ptr::null_mut();
    };
    handle
        .checker
        .names()
        .nth(index)
        .map_or(ptr::null_mut(), str_to_c)
}

/// Return the library version string. The pointer is static.
#[unsafe(no_mangle)]
pub extern "C" fn patronus_version() -> *const c_char {
    const VERSION: &CStr = match CStr::from_bytes_with_nul(
        concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes(),
    ) {
        Ok(v) => v,
        Err(_) => c"unknown",
    };
    VERSION.as_ptr()
}

/// Free a heap-allocated C string returned by patronus functions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn patronus_free_str(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ── Internal helpers ────────────────────────────────────────────

fn cstr_to_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

fn str_to_c(s: &str) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

fn set_error(out: *mut *mut c_char, msg: &str) {
    if !out.is_null() {
        unsafe {
            *out = str_to_c(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::MaybeUninit;

    fn sample_handle() -> *mut PatronusChecker {
        let mut checker = Checker::new();
        checker.register_check(patronus_sample::Sample).unwrap();
        Box::into_raw(Box::new(PatronusChecker::new(checker, Config::default())))
    }

    struct Refuses;

    impl patronus_provider::Check for Refuses {
        const NAME: &'static CStr = c"Refuses";

        fn check(
            &self,
            _: &Properties,
            _: &str,
        ) -> Result<Vec<patronus_provider::Annotation>, patronus_provider::Failure> {
            Err(patronus_provider::Failure::InvalidInput("never".into()))
        }
    }

    /// Returns the status, the array (empty unless OK) and the failure count.
    fn check(
        handle: *const PatronusChecker,
        language: &CStr,
        text: &str,
    ) -> (c_int, AnnotationArray, usize) {
        let props = RawProperties {
            primary_language: language.as_ptr(),
        };
        let mut out = MaybeUninit::<AnnotationArray>::uninit();
        let mut failed = usize::MAX;
        let status = unsafe {
            patronus_check(
                handle,
                &props,
                text.as_ptr(),
                text.len(),
                out.as_mut_ptr(),
                &mut failed,
            )
        };
        if status == STATUS_OK {
            (status, unsafe { out.assume_init() }, failed)
        } else {
            (status, PArray::empty(), failed)
        }
    }

    #[test]
    fn check_returns_merged_array() {
        let handle = sample_handle();
        let (status, mut arr, failed) = check(handle, c"en", "so mistakes are good, right");
        assert_eq!(status, STATUS_OK);
        assert_eq!(arr.len, 1);
        assert_eq!(failed, 0);

        let ann = unsafe { &arr.as_slice()[0] };
        assert_eq!(ann.offset, 3);
        assert_eq!(ann.length, 17);
        let message = unsafe { CStr::from_ptr(ann.message) };
        assert_eq!(message, c"Are you sure about mistakes being good?");
        assert_eq!(ann.suggestions.len, 2);

        // Host-packed arrays do not depend on the providers.
        unsafe { patronus_free(handle) };
        unsafe { patronus_release_annotations(&mut arr) };
        assert_eq!(arr.len, 0);
        unsafe { patronus_release_annotations(&mut arr) };
    }

    #[test]
    fn null_props_use_configured_language() {
        let handle = sample_handle();
        let text = "mistakes are good";
        let mut out = MaybeUninit::<AnnotationArray>::uninit();
        let status = unsafe {
            patronus_check(
                handle,
                ptr::null(),
                text.as_ptr(),
                text.len(),
                out.as_mut_ptr(),
                ptr::null_mut(),
            )
        };
        assert_eq!(status, STATUS_OK);
        let mut arr = unsafe { out.assume_init() };
        assert_eq!(arr.len, 1);
        unsafe {
            patronus_release_annotations(&mut arr);
            patronus_free(handle);
        }
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let handle = sample_handle();
        let mut out = MaybeUninit::<AnnotationArray>::uninit();
        let props = RawProperties {
            primary_language: c"en".as_ptr(),
        };
        unsafe {
            assert_eq!(
                patronus_check(ptr::null(), &props, ptr::null(), 0, out.as_mut_ptr(), ptr::null_mut()),
                STATUS_INVALID_INPUT
            );
            assert_eq!(
                patronus_check(handle, &props, ptr::null(), 4, out.as_mut_ptr(), ptr::null_mut()),
                STATUS_INVALID_INPUT
            );
            let bad = [0xff_u8, 0xfe];
            assert_eq!(
                patronus_check(handle, &props, bad.as_ptr(), bad.len(), out.as_mut_ptr(), ptr::null_mut()),
                STATUS_INVALID_INPUT
            );
            assert_eq!(
                patronus_check(handle, &props, ptr::null(), 0, ptr::null_mut(), ptr::null_mut()),
                STATUS_INVALID_INPUT
            );
            patronus_free(handle);
        }
    }

    #[test]
    fn empty_text_gives_empty_array() {
        let handle = sample_handle();
        let (status, mut arr, _) = check(handle, c"en", "");
        assert_eq!(status, STATUS_OK);
        assert_eq!(arr.len, 0);
        assert!(arr.has_release());
        unsafe {
            patronus_release_annotations(&mut arr);
            patronus_free(handle);
        }
    }

    #[test]
    fn failed_providers_are_counted() {
        let mut checker = Checker::new();
        checker.register_check(Refuses).unwrap();
        checker.register_check(patronus_sample::Sample).unwrap();
        let handle = Box::into_raw(Box::new(PatronusChecker::new(checker, Config::default())));

        let (status, mut arr, failed) = check(handle, c"en", "mistakes are good");
        assert_eq!(status, STATUS_OK);
        assert_eq!(arr.len, 1);
        assert_eq!(failed, 1);

        let (status, mut empty, failed) = check(handle, c"en", "all fine");
        assert_eq!(status, STATUS_OK);
        assert_eq!(empty.len, 0);
        assert_eq!(failed, 1);
        unsafe {
            patronus_release_annotations(&mut arr);
            patronus_release_annotations(&mut empty);
            patronus_free(handle);
        }
    }

    #[test]
    fn provider_introspection() {
        let handle = sample_handle();
        unsafe {
            assert_eq!(patronus_provider_count(handle), 1);
            let name = patronus_provider_name(handle, 0);
            assert_eq!(CStr::from_ptr(name), c"Sample checker");
            patronus_free_str(name);
            assert!(patronus_provider_name(handle, 1).is_null());
            assert_eq!(patronus_provider_count(ptr::null()), 0);
            patronus_free(handle);
        }
    }

    #[test]
    fn missing_config_file_reports_error() {
        let mut error: *mut c_char = ptr::null_mut();
        let handle = unsafe { patronus_new(c"/no/such/patronus.toml".as_ptr(), &mut error) };
        assert!(handle.is_null());
        assert!(!error.is_null());
        let message = unsafe { CStr::from_ptr(error) }.to_str().unwrap().to_owned();
        assert!(message.contains("/no/such/patronus.toml"));
        unsafe { patronus_free_str(error) };
    }

    #[test]
    fn version_is_package_version() {
        let version = unsafe { CStr::from_ptr(patronus_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
