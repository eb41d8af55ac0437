//! Stream provider lookup
//!
//! Songs carry a [`ProviderDescriptor`] naming the component that created
//! them and the method that turns them into stream data. The registry maps
//! those names to [`StreamProvider`] implementations.

use crate::error::Result;
use crate::traits::StreamProvider;
use crate::types::{ProviderDescriptor, Song, StreamData, DEFAULT_PROVIDER_METHOD};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registered stream providers, keyed by `(owner_id, method)`
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<(String, String), Arc<dyn StreamProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for an owner's named method
    pub fn register(
        &mut self,
        owner_id: impl Into<String>,
        method: impl Into<String>,
        provider: Arc<dyn StreamProvider>,
    ) {
        let descriptor = ProviderDescriptor::new(owner_id, method);
        let key = (descriptor.owner_id.clone(), descriptor.method());
        self.providers.insert(key, provider);
    }

    /// Register a provider under the owner's default method
    pub fn register_default(&mut self, owner_id: impl Into<String>, provider: Arc<dyn StreamProvider>) {
        self.register(owner_id, DEFAULT_PROVIDER_METHOD, provider);
    }

    /// Find the provider for a descriptor
    ///
    /// Falls back to the owner's default method when the named one is not
    /// registered.
    pub fn resolve(&self, descriptor: &ProviderDescriptor) -> Option<Arc<dyn StreamProvider>> {
        let owner = descriptor.owner_id.clone();
        self.providers
            .get(&(owner.clone(), descriptor.method()))
            .or_else(|| {
                self.providers
                    .get(&(owner, DEFAULT_PROVIDER_METHOD.to_string()))
            })
            .cloned()
    }

    /// Fetch stream data for a song through its provider
    ///
    /// Returns `Ok(None)` when no provider is registered for the song's owner.
    pub async fn stream_data(&self, song: &Song) -> Result<Option<StreamData>> {
        match self.resolve(song.provider()) {
            Some(provider) => provider.stream_data(song).await,
            None => Ok(None),
        }
    }

    /// Number of registered provider methods
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.providers.keys().collect();
        keys.sort();
        f.debug_struct("ProviderRegistry")
            .field("methods", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueuerError;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl StreamProvider for Fixed {
        async fn stream_data(&self, _song: &Song) -> Result<Option<StreamData>> {
            Ok(Some(StreamData::Url(self.0.to_string())))
        }
    }

    struct Failing;

    #[async_trait]
    impl StreamProvider for Failing {
        async fn stream_data(&self, _song: &Song) -> Result<Option<StreamData>> {
            Err(QueuerError::provider("upstream unavailable"))
        }
    }

    fn song(owner: &str, method: &str) -> Song {
        Song::new("Song", ProviderDescriptor::new(owner, method))
    }

    #[tokio::test]
    async fn named_method_wins_over_default() {
        let mut registry = ProviderRegistry::new();
        registry.register_default("tube", Arc::new(Fixed("default")));
        registry.register("tube", "live", Arc::new(Fixed("live")));

        let data = registry.stream_data(&song("tube", "live")).await.unwrap();
        assert_eq!(data, Some(StreamData::Url("live".to_string())));
    }

    #[tokio::test]
    async fn unknown_method_falls_back_to_default() {
        let mut registry = ProviderRegistry::new();
        registry.register_default("tube", Arc::new(Fixed("default")));

        let data = registry.stream_data(&song("tube", "missing")).await.unwrap();
        assert_eq!(data, Some(StreamData::Url("default".to_string())));
    }

    #[tokio::test]
    async fn unknown_owner_yields_nothing() {
        let registry = ProviderRegistry::new();
        let data = registry.stream_data(&song("nobody", "")).await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let mut registry = ProviderRegistry::new();
        registry.register_default("tube", Arc::new(Failing));

        let result = registry.stream_data(&song("tube", "")).await;
        assert!(matches!(result, Err(QueuerError::Provider(_))));
    }
}
