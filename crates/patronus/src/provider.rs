// Registered provider: the function table, its context, and the library
// that holds the code behind both.
//
// The host never touches the context; it only passes it back on every call.
// Contexts that do not advertise PROVIDER_FLAG_CONCURRENT are single-writer,
// so calls into them, array releases included, are serialized by `call_lock`.

use std::ffi::CStr;
use std::mem::MaybeUninit;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use libloading::Library;
use patronus_core::CheckError;
use patronus_provider::{
    AnnotationArray as RawArray, Check, RawProperties, RawProvider, STATUS_INVALID_INPUT,
    STATUS_OK, STATUS_PROVIDER_FAULT,
};

use crate::array::AnnotationArray;
use crate::error::LoadError;

/// A provider owned by the host.
///
/// Dropping it calls the provider's `free_provider` and then unloads its
/// library. Every array it produced borrows it, so both happen only after
/// all those arrays are released.
pub struct Provider {
    raw: RawProvider,
    name: String,
    call_lock: Option<Mutex<()>>,
    faulted: AtomicBool,
    // Declared last: dropped after `Drop::drop` has run `free_provider`.
    _library: Option<Library>,
}

// The context is only reached through `raw`'s functions. Calls are serialized
// unless the provider declared its context safe for concurrent use.
unsafe impl Send for Provider {}
unsafe impl Sync for Provider {}

impl Provider {
    /// Wrap a Rust checker.
    pub fn from_check<C: Check>(checker: C) -> Self {
        let raw = RawProvider::from_check(checker);
        let name = C::NAME.to_string_lossy().into_owned();
        Self::assemble(raw, name, None)
    }

    /// Adopt a function table produced by foreign code.
    ///
    /// On error the provider's `free_provider` has already been called.
    ///
    /// # Safety
    ///
    /// `raw` must follow the provider ABI: valid function pointers, a context
    /// meaningful to them, and `library` (if any) must contain their code.
    pub unsafe fn from_raw(raw: RawProvider, library: Option<Library>) -> Result<Self, LoadError> {
        let name_ptr = unsafe { (raw.name)() };
        let name = if name_ptr.is_null() {
            None
        } else {
            unsafe { CStr::from_ptr(name_ptr) }
                .to_str()
                .ok()
                .map(str::to_owned)
        };
        match name {
            Some(name) if !name.is_empty() => Ok(Self::assemble(raw, name, library)),
            _ => {
                if let Some(free) = raw.free_provider {
                    unsafe { free(raw.context) };
                }
                Err(LoadError::InvalidName)
            }
        }
    }

    /// Load a single provider library.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        crate::loader::load_library(path)
    }

    fn assemble(raw: RawProvider, name: String, library: Option<Library>) -> Self {
        let call_lock = if raw.is_concurrent() {
            None
        } else {
            Some(Mutex::new(()))
        };
        Self {
            raw,
            name,
            call_lock,
            faulted: AtomicBool::new(false),
            _library: library,
        }
    }

    /// Name reported by the provider, read once at registration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the context accepts concurrent `check` calls.
    pub fn is_concurrent(&self) -> bool {
        self.call_lock.is_none()
    }

    /// Whether an earlier fault took this provider out of rotation.
    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    /// Run the provider on `text` and validate what comes back.
    pub fn check(&self, language: &CStr, text: &[u8]) -> Result<AnnotationArray<'_>, CheckError> {
        if self.is_faulted() {
            return Err(CheckError::Disabled {
                provider: self.name.clone(),
            });
        }

        let props = RawProperties {
            primary_language: language.as_ptr(),
        };
        let mut out = MaybeUninit::<RawArray>::uninit();
        let status = {
            let _guard = self
                .call_lock
                .as_ref()
                .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner));
            unsafe {
                (self.raw.check)(
                    &props,
                    text.as_ptr(),
                    text.len(),
                    self.raw.context,
                    out.as_mut_ptr(),
                )
            }
        };

        match status {
            STATUS_OK => {
                let raw = unsafe { out.assume_init() };
                unsafe {
                    AnnotationArray::validate(raw, text.len(), &self.name, self.call_lock.as_ref())
                }
            }
            STATUS_INVALID_INPUT => Err(CheckError::invalid_input(
                &self.name,
                format!("language {language:?} or text rejected"),
            )),
            STATUS_PROVIDER_FAULT => {
                self.mark_faulted();
                Err(CheckError::fault(&self.name, "provider reported an internal failure"))
            }
            other => Err(CheckError::violation(
                &self.name,
                format!("unknown status code {other}"),
            )),
        }
    }

    fn mark_faulted(&self) {
        if !self.faulted.swap(true, Ordering::AcqRel) {
            tracing::warn!(provider = %self.name, "provider faulted and is disabled");
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("concurrent", &self.is_concurrent())
            .field("faulted", &self.is_faulted())
            .finish()
    }
}

impl Drop for Provider {
    fn drop(&mut self) {
        if let Some(free) = self.raw.free_provider {
            tracing::debug!(provider = %self.name, "freeing provider");
            unsafe { free(self.raw.context) };
        }
    }
}
