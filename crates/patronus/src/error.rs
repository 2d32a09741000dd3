// Host-side error types. Per-provider check failures use
// `patronus_core::CheckError`; these cover the registry, loading and config.

use std::ffi::c_int;
use std::path::PathBuf;

/// Registry mutation failed.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Another provider is already registered under this name.
    #[error("a provider named {0:?} is already registered")]
    DuplicateName(String),

    /// No provider is registered under this name.
    #[error("no provider named {0:?} is registered")]
    UnknownProvider(String),
}

/// A provider library could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read provider directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot load {path}: {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The library does not export `patronus_provider_version`.
    #[error("{0} is not a patronus provider")]
    NotAProvider(PathBuf),

    #[error("{path} implements provider ABI version {found}, expected {expected}")]
    VersionMismatch {
        path: PathBuf,
        found: c_int,
        expected: c_int,
    },

    #[error("{path} failed to initialize (status {status})")]
    InitFailed { path: PathBuf, status: c_int },

    /// `name()` returned NULL, an empty string or invalid UTF-8.
    #[error("provider returned an invalid name")]
    InvalidName,
}

/// Configuration could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {message}")]
    Parse { message: String },
}
