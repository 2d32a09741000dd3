//! Patronus host: load text checker providers and dispatch text to them.
//!
//! ```ignore
//! use patronus::{Checker, Config};
//!
//! let config = Config::load(None)?;
//! let checker = Checker::from_config(&config);
//! let report = checker.check(&config.properties(), "Tou manny misteaks");
//! for annotation in report.annotations() {
//!     println!("{}..{} {}", annotation.offset(), annotation.end(), annotation.message());
//! }
//! // Dropping `report` releases every provider array exactly once.
//! ```
//!
//! Every array a provider returns is wrapped in an [`AnnotationArray`] that
//! releases it through the provider's own release function when dropped.
//! Arrays borrow the [`Checker`], so providers outlive their results.

pub mod array;
pub mod checker;
pub mod config;
pub mod error;
pub mod loader;
pub mod provider;

pub use array::{AnnotationArray, AnnotationRef};
pub use checker::{CheckReport, Checker, ProviderResult};
pub use config::Config;
pub use error::{ConfigError, LoadError, RegistryError};
pub use provider::Provider;

pub use patronus_core::{Annotation, AnnotationKind, CheckError, FailureKind, Properties};
