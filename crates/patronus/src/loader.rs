// Dynamic provider discovery and loading.
//
// A provider library exports `patronus_provider_version` and
// `patronus_provider_init`. Libraries without the version symbol are not
// providers and are skipped; a version mismatch or failed init is an error
// for that library only.

use std::ffi::c_int;
use std::fs;
use std::mem::MaybeUninit;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use patronus_provider::{
    PROVIDER_INIT_SYMBOL, PROVIDER_VERSION, PROVIDER_VERSION_SYMBOL, RawProvider, STATUS_OK,
};

use crate::error::LoadError;
use crate::provider::Provider;

type VersionFn = unsafe extern "C" fn() -> c_int;
type InitFn = unsafe extern "C" fn(*mut RawProvider) -> c_int;

/// Platform extension of dynamic libraries.
#[cfg(target_os = "macos")]
pub const DYLIB_EXTENSION: &str = "dylib";
#[cfg(target_os = "windows")]
pub const DYLIB_EXTENSION: &str = "dll";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DYLIB_EXTENSION: &str = "so";

/// Whether `path` looks like a dynamic library on this platform.
pub fn is_dylib(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == DYLIB_EXTENSION)
}

/// Dynamic libraries directly inside `dir`, sorted by file name so that
/// registration order does not depend on directory iteration order.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_dylib(&path) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Load one provider library.
pub fn load_library(path: &Path) -> Result<Provider, LoadError> {
    let lib_err = |source| LoadError::Library {
        path: path.to_path_buf(),
        source,
    };

    // Loading runs the library's initializers. Provider directories are
    // trusted the same way as the host's own dependencies.
    let library = unsafe { Library::new(path) }.map_err(lib_err)?;

    let version = unsafe {
        match library.get::<VersionFn>(PROVIDER_VERSION_SYMBOL) {
            Ok(get_version) => get_version(),
            Err(_) => return Err(LoadError::NotAProvider(path.to_path_buf())),
        }
    };
    if version != PROVIDER_VERSION {
        return Err(LoadError::VersionMismatch {
            path: path.to_path_buf(),
            found: version,
            expected: PROVIDER_VERSION,
        });
    }

    let raw = unsafe {
        let init: Symbol<InitFn> = library.get(PROVIDER_INIT_SYMBOL).map_err(lib_err)?;
        let mut out = MaybeUninit::<RawProvider>::uninit();
        let status = init(out.as_mut_ptr());
        if status != STATUS_OK {
            return Err(LoadError::InitFailed {
                path: path.to_path_buf(),
                status,
            });
        }
        out.assume_init()
    };

    let provider = unsafe { Provider::from_raw(raw, Some(library)) }?;
    tracing::info!(provider = provider.name(), path = %path.display(), "loaded provider");
    Ok(provider)
}

/// Load every provider library in `dir`, in file name order.
///
/// Libraries that fail to load are logged and skipped so that one broken
/// provider does not take the others down.
pub fn load_dir(dir: &Path) -> Result<Vec<Provider>, LoadError> {
    let mut providers = Vec::new();
    for path in discover(dir)? {
        match load_library(&path) {
            Ok(provider) => providers.push(provider),
            Err(LoadError::NotAProvider(path)) => {
                tracing::debug!(path = %path.display(), "skipping non-provider library");
            }
            Err(e) => tracing::warn!("{e}"),
        }
    }
    Ok(providers)
}
