// Checker facade: provider registry and dispatch.
//
// Results are reported per provider in registration order. Arrays are
// passed through untouched (no merging, no de-duplication), each keeping
// its own release capability. A failing provider only loses its own
// contribution.

use std::ffi::CString;

use hashbrown::HashMap;
use patronus_core::{Annotation, CheckError, Properties};
use patronus_provider::Check;

use crate::array::{AnnotationArray, AnnotationRef};
use crate::config::Config;
use crate::error::RegistryError;
use crate::loader;
use crate::provider::Provider;

/// Registry of providers and entry point for checking text.
///
/// `check` takes `&self` and may be called from several threads at once;
/// registering and unregistering take `&mut self`. Since every returned
/// array borrows the checker, a provider cannot be unregistered while any
/// of its arrays is still alive.
#[derive(Debug, Default)]
pub struct Checker {
    providers: Vec<Provider>,
    index: HashMap<String, usize>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every provider found in the configured directories.
    ///
    /// Disabled providers are freed right after loading. A provider whose
    /// name is already taken is skipped.
    pub fn from_config(config: &Config) -> Self {
        let mut checker = Self::new();
        for dir in config.provider_search_paths() {
            if !dir.is_dir() {
                continue;
            }
            let providers = match loader::load_dir(&dir) {
                Ok(providers) => providers,
                Err(e) => {
                    tracing::warn!("{e}");
                    continue;
                }
            };
            for provider in providers {
                if config.is_disabled(provider.name()) {
                    tracing::info!(provider = provider.name(), "provider disabled by config");
                    continue;
                }
                if let Err(e) = checker.register(provider) {
                    tracing::warn!("{e}");
                }
            }
        }
        checker
    }

    /// Append a provider. Its name must be unique.
    ///
    /// On a duplicate name the provider is dropped (and freed).
    pub fn register(&mut self, provider: Provider) -> Result<(), RegistryError> {
        let name = provider.name().to_owned();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        tracing::debug!(provider = %name, position = self.providers.len(), "registering provider");
        self.index.insert(name, self.providers.len());
        self.providers.push(provider);
        Ok(())
    }

    /// Register a Rust checker.
    pub fn register_check<C: Check>(&mut self, checker: C) -> Result<(), RegistryError> {
        self.register(Provider::from_check(checker))
    }

    /// Remove a provider and free it. The remaining order is unchanged.
    pub fn unregister(&mut self, name: &str) -> Result<(), RegistryError> {
        let position = self
            .index
            .remove(name)
            .ok_or_else(|| RegistryError::UnknownProvider(name.to_owned()))?;
        let provider = self.providers.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        tracing::debug!(provider = name, "unregistering provider");
        drop(provider);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.index.get(name).map(|&i| &self.providers[i])
    }

    /// Providers in registration order.
    pub fn providers(&self) -> impl ExactSizeIterator<Item = &Provider> {
        self.providers.iter()
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.providers.iter().map(Provider::name)
    }

    /// Check `text` with every registered provider, one after another.
    pub fn check(&self, props: &Properties, text: &str) -> CheckReport<'_> {
        self.check_bytes(props, text.as_bytes())
    }

    /// Check raw bytes. Offsets in the result are byte offsets.
    pub fn check_bytes(&self, props: &Properties, text: &[u8]) -> CheckReport<'_> {
        self.check_selected(props, text, |_| true)
    }

    /// Check with the providers whose names pass `select`.
    pub fn check_selected(
        &self,
        props: &Properties,
        text: &[u8],
        select: impl Fn(&str) -> bool,
    ) -> CheckReport<'_> {
        let selected: Vec<&Provider> = self.providers.iter().filter(|p| select(p.name())).collect();
        tracing::debug!(providers = selected.len(), bytes = text.len(), "dispatching check");

        let results = match language_cstring(props) {
            Ok(language) => selected
                .into_iter()
                .map(|p| ProviderResult::new(p.name(), p.check(&language, text)))
                .collect(),
            Err(detail) => reject_all(selected, &detail),
        };
        CheckReport::new(text.len(), results)
    }

    /// Check `text` with every provider, each on its own thread.
    ///
    /// The report has the same order as [`Checker::check`]. Providers whose
    /// context is not concurrency-safe are still called one at a time.
    pub fn check_parallel(&self, props: &Properties, text: &str) -> CheckReport<'_> {
        let text = text.as_bytes();
        tracing::debug!(providers = self.providers.len(), bytes = text.len(), "dispatching parallel check");

        let language = match language_cstring(props) {
            Ok(language) => language,
            Err(detail) => {
                let results = reject_all(self.providers.iter().collect(), &detail);
                return CheckReport::new(text.len(), results);
            }
        };

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .providers
                .iter()
                .map(|p| {
                    let language = &language;
                    (p.name(), scope.spawn(move || p.check(language, text)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(name, handle)| {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        Err(CheckError::fault(name, "dispatch thread panicked"))
                    });
                    ProviderResult::new(name, outcome)
                })
                .collect()
        });
        CheckReport::new(text.len(), results)
    }
}

fn language_cstring(props: &Properties) -> Result<CString, String> {
    CString::new(props.primary_language.as_str())
        .map_err(|_| format!("language tag {:?} contains a NUL byte", props.primary_language))
}

fn reject_all<'c>(providers: Vec<&'c Provider>, detail: &str) -> Vec<ProviderResult<'c>> {
    providers
        .into_iter()
        .map(|p| ProviderResult::new(p.name(), Err(CheckError::invalid_input(p.name(), detail))))
        .collect()
}

/// Outcome of one provider within a check.
#[derive(Debug)]
pub struct ProviderResult<'c> {
    provider: &'c str,
    outcome: Result<AnnotationArray<'c>, CheckError>,
}

impl<'c> ProviderResult<'c> {
    fn new(provider: &'c str, outcome: Result<AnnotationArray<'c>, CheckError>) -> Self {
        match &outcome {
            Err(e @ CheckError::ProtocolViolation { .. }) => tracing::warn!("{e}"),
            Err(e) => tracing::debug!("{e}"),
            Ok(arr) => tracing::trace!(provider, annotations = arr.len(), "provider returned"),
        }
        Self { provider, outcome }
    }

    pub fn provider(&self) -> &'c str {
        self.provider
    }

    pub fn outcome(&self) -> &Result<AnnotationArray<'c>, CheckError> {
        &self.outcome
    }

    pub fn into_outcome(self) -> Result<AnnotationArray<'c>, CheckError> {
        self.outcome
    }
}

/// Aggregate result of [`Checker::check`].
///
/// Owns every successful provider's array; dropping the report releases
/// each of them once.
#[derive(Debug)]
pub struct CheckReport<'c> {
    text_len: usize,
    results: Vec<ProviderResult<'c>>,
}

impl<'c> CheckReport<'c> {
    fn new(text_len: usize, results: Vec<ProviderResult<'c>>) -> Self {
        Self { text_len, results }
    }

    /// Length in bytes of the checked text.
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// Per-provider outcomes in registration order.
    pub fn results(&self) -> &[ProviderResult<'c>] {
        &self.results
    }

    /// Arrays of the providers that succeeded, in registration order.
    pub fn arrays(&self) -> impl Iterator<Item = &AnnotationArray<'c>> {
        self.results.iter().filter_map(|r| r.outcome.as_ref().ok())
    }

    /// All annotations: provider by provider in registration order, each
    /// provider's own order preserved.
    pub fn annotations(&self) -> impl Iterator<Item = AnnotationRef<'_>> {
        self.arrays().flat_map(|arr| arr.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckError> {
        self.results.iter().filter_map(|r| r.outcome.as_ref().err())
    }

    /// Total number of annotations.
    pub fn len(&self) -> usize {
        self.arrays().map(AnnotationArray::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy all annotations out; the arrays are released when the report is
    /// dropped.
    pub fn to_annotations(&self) -> Vec<Annotation> {
        self.annotations().map(|a| a.to_annotation()).collect()
    }

    /// Take the successful arrays, dropping the failures.
    pub fn into_arrays(self) -> Vec<AnnotationArray<'c>> {
        self.results
            .into_iter()
            .filter_map(|r| r.outcome.ok())
            .collect()
    }
}
