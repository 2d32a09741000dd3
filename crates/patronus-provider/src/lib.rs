//! Provider side of the Patronus checker ABI.
//!
//! A provider is any shared library (or in-process value) that hands the host
//! a [`RawProvider`] function table. Results travel as [`PArray`]s that carry
//! their own release function, so the host can free them without knowing
//! which allocator, or which language runtime, produced them.
//!
//! # Writing a provider in Rust
//!
//! ```ignore
//! use patronus_provider::{Check, Failure, export_provider};
//!
//! struct Mine;
//!
//! impl Check for Mine {
//!     const NAME: &'static std::ffi::CStr = c"Mine";
//!     fn check(&self, props: &Properties, text: &str) -> Result<Vec<Annotation>, Failure> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! export_provider!(Ok(Mine));
//! ```
//!
//! # Writing a provider in another language
//!
//! Export `patronus_provider_version` returning [`PROVIDER_VERSION`] and
//! `patronus_provider_init`, which fills a `RawProvider` and returns
//! [`STATUS_OK`]. Every array returned from `check` must have a non-NULL
//! release function that frees the nested suggestion arrays too.

use std::ffi::c_int;

pub mod abi;
pub mod check;
mod macros;
pub mod pack;
pub mod parray;

pub use abi::{
    AnnotationArray, RawAnnotation, RawProperties, RawProvider, Suggestion, SuggestionArray,
    free_annotations,
};
pub use check::{Check, Failure, init_into};
pub use pack::{PackError, pack_annotations};
pub use parray::{PArray, ReleaseFn};

// Re-exported so providers only need this crate.
pub use patronus_core::{Annotation, AnnotationKind, Properties};

/// ABI version implemented by this crate.
pub const PROVIDER_VERSION: c_int = 2;

/// Symbol returning the ABI version of a provider library.
pub const PROVIDER_VERSION_SYMBOL: &[u8] = b"patronus_provider_version\0";

/// Symbol filling in the provider's function table.
pub const PROVIDER_INIT_SYMBOL: &[u8] = b"patronus_provider_init\0";

/// The call succeeded and wrote its output.
pub const STATUS_OK: c_int = 0;
/// Text or properties failed the provider's preconditions.
pub const STATUS_INVALID_INPUT: c_int = 1;
/// The provider failed internally and should not be used again.
pub const STATUS_PROVIDER_FAULT: c_int = 2;

/// The provider context tolerates concurrent `check` calls.
pub const PROVIDER_FLAG_CONCURRENT: u32 = 1;
