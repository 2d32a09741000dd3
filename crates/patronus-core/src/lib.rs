//! Shared types for the Patronus checker host and its providers.
//!
//! Everything here is plain owned Rust data. The C-compatible layout of the
//! same concepts lives in `patronus-provider`; this crate is what callers
//! end up holding once a provider's result has been copied out.

pub mod annotation;
pub mod error;
pub mod kind;
pub mod language;

pub use annotation::{Annotation, Properties};
pub use error::{CheckError, FailureKind};
pub use kind::AnnotationKind;
