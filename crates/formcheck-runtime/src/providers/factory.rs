//! Named provider construction.
//!
//! `provider.type` in the runtime config selects a factory here; the
//! factory turns `provider.options` into a live provider. Checking options
//! never touches the network, so `check-config` and startup can run it.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError};
use crate::config::ProviderSettings;

/// Builds one kind of provider from JSON options.
pub trait ProviderFactory: Send + Sync {
    /// Value of `provider.type` that selects this factory.
    fn kind(&self) -> &'static str;

    /// Resolve credentials and construct the provider.
    fn build(&self, options: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;

    /// Offline sanity check of the options.
    fn check(&self, options: &JsonValue) -> Result<(), ProviderError>;

    fn describe(&self) -> &'static str {
        "LLM provider"
    }
}

/// Factories by kind.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<&'static str, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every provider compiled into this build.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "openai")]
        registry.register(Arc::new(super::OpenAiProviderFactory));
        registry
    }

    /// Add a factory, replacing any earlier one of the same kind.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories.insert(factory.kind(), factory);
    }

    pub fn build(&self, settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let provider = self.lookup(&settings.kind)?.build(&settings.options)?;
        tracing::debug!(kind = %settings.kind, provider = provider.name(), "Provider built");
        Ok(provider)
    }

    pub fn check(&self, settings: &ProviderSettings) -> Result<(), ProviderError> {
        self.lookup(&settings.kind)?.check(&settings.options)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn describe(&self, kind: &str) -> Option<&'static str> {
        self.factories.get(kind).map(|f| f.describe())
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.factories.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    fn lookup(&self, kind: &str) -> Result<&Arc<dyn ProviderFactory>, ProviderError> {
        self.factories.get(kind).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "no provider registered for '{}' (known: {})",
                kind,
                self.kinds().join(", ")
            ))
        })
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ProviderRegistry").field(&self.kinds()).finish()
    }
}
