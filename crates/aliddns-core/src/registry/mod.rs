//! Plugin-based provider registry
//!
//! The registry maps provider and IP-resolver type names to factories so the
//! binary can build both from configuration without hardcoded if-else chains.
//!
//! ## Registration
//!
//! Implementation crates expose a `register()` function:
//!
//! ```rust,ignore
//! use aliddns_core::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! aliddns_alidns::register(&registry);
//! aliddns_ip::register(&registry);
//!
//! let provider = registry.create_provider("alidns", &config)?;
//! let ip_source = registry.create_ip_source(&config)?;
//! ```

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory, IpSource, IpSourceFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of DNS provider and IP source factories
///
/// Uses interior mutability so registration works through a shared reference.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,

    /// Registered IP source factories
    ip_sources: RwLock<HashMap<String, Box<dyn IpSourceFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory under `name`
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), factory);
    }

    /// Register an IP source factory under `name`
    pub fn register_ip_source(&self, name: impl Into<String>, factory: Box<dyn IpSourceFactory>) {
        let mut sources = self.ip_sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.insert(name.into(), factory);
    }

    /// Create the DNS provider registered as `name`
    pub fn create_provider(&self, name: &str, config: &DdnsConfig) -> Result<Box<dyn DnsProvider>> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", name)))?;

        factory.create(config)
    }

    /// Create the IP source selected by `config.ip_resolver`
    pub fn create_ip_source(&self, config: &DdnsConfig) -> Result<Box<dyn IpSource>> {
        let source_type = config.ip_resolver.type_name();
        let sources = self.ip_sources.read().unwrap_or_else(PoisonError::into_inner);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown IP source type: {}", source_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }

    /// Check if an IP source type is registered
    pub fn has_ip_source(&self, name: &str) -> bool {
        let sources = self.ip_sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }
}
