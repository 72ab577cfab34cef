//! Provider registry
//!
//! Maps instance ids to live adapters. The registry is rebuilt from
//! configuration whenever settings change; callers that share it across
//! tasks wrap it in a lock.

use super::adapter::Provider;
use super::error::ProviderResult;
use super::factory::build_provider;
use crate::config::{SafeLogging, VaultChatConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Lookup table of configured providers, ordered by id
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every enabled provider in `config`
    pub fn from_config(config: &VaultChatConfig) -> ProviderResult<Self> {
        let mut registry = Self::new();
        registry.rebuild(config)?;
        Ok(registry)
    }

    /// Add a provider under its own id, returning the one it replaced
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Option<Arc<dyn Provider>> {
        let id = provider.id().to_string();
        let previous = self.providers.insert(id.clone(), provider);
        if previous.is_some() {
            warn!("Replaced provider '{}' in registry", id);
        }
        previous
    }

    /// Look up a provider by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(id).cloned()
    }

    /// All registered providers, ordered by id
    pub fn list(&self) -> Vec<Arc<dyn Provider>> {
        self.providers.values().cloned().collect()
    }

    /// Registered ids in order
    pub fn ids(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn clear(&mut self) {
        self.providers.clear();
    }

    /// Replace the contents with the enabled providers of `config`
    ///
    /// On error the registry is left unchanged.
    pub fn rebuild(&mut self, config: &VaultChatConfig) -> ProviderResult<()> {
        let mut providers = BTreeMap::new();

        for entry in config.enabled_providers() {
            let http = entry.http.clone().unwrap_or_else(|| config.http.clone());
            let provider = build_provider(entry, http)?;
            info!("Registered provider {}", entry.safe_for_logging());
            providers.insert(entry.id.clone(), provider);
        }

        self.providers = providers;
        Ok(())
    }
}
