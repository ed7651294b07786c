//! Application State Management
//!
//! This module provides the application state that contains all services
//! and their dependencies, following the dependency injection pattern.

use log::info;
use std::sync::Arc;

use crate::api::auth::ApiKeys;
use crate::api::rate_limit::RateLimiter;
use crate::config::{AppConfig, StoreBackend};
use crate::registry::LocationRegistry;
use crate::store::{file_store::JsonFileStore, mock_store::MockDocumentStore, DocumentStore, StoreError};

/// API key accepted by [`AppState::new_for_testing`]
pub const TEST_API_KEY: &str = "test-key";

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<LocationRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub api_keys: ApiKeys,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Result<Self, StoreError> {
        info!("Initializing application state with configuration");

        // Create store backend based on configuration
        let store: Arc<dyn DocumentStore> = match config.store.backend {
            StoreBackend::File => {
                info!("Using JSON file store backend with path: {}", config.store.path);
                Arc::new(JsonFileStore::new(&config.store.path)?)
            }
            StoreBackend::Mock => {
                info!("Using mock store backend");
                Arc::new(MockDocumentStore::new())
            }
        };

        let state = Self::with_store(config, store);
        info!("Application state initialized successfully");
        Ok(state)
    }

    /// Create application state around an existing store
    pub fn with_store(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        if config.api_keys.is_empty() {
            log::warn!("No API keys configured, every request will be rejected");
        }
        let registry = LocationRegistry::new(store)
            .with_label_dedupe(config.compatibility.dedupe_location_labels);

        Self {
            registry: Arc::new(registry),
            rate_limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            api_keys: ApiKeys::new(config.api_keys.clone()),
            config,
        }
    }

    /// Create application state for testing: mock store, one API key, no rate limit
    pub fn new_for_testing() -> Self {
        Self::testing_with_store(Arc::new(MockDocumentStore::new()))
    }

    /// Like [`AppState::new_for_testing`] but around a caller-supplied store
    pub fn testing_with_store(store: Arc<dyn DocumentStore>) -> Self {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Mock;
        config.api_keys = vec![TEST_API_KEY.to_string()];
        config.rate_limit.max_requests_per_second = 0;
        Self::with_store(config, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_config_file_backend() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.store.path = dir.path().join("data.json").to_string_lossy().into_owned();
        config.api_keys = vec!["k".to_string()];

        let state = AppState::from_config(config).unwrap();
        assert!(dir.path().join("data.json").exists());
        assert!(state.api_keys.validate("k"));
        assert!(state.rate_limiter.is_enabled());
    }

    #[test]
    fn test_new_for_testing() {
        let state = AppState::new_for_testing();
        assert!(state.api_keys.validate(TEST_API_KEY));
        assert!(!state.rate_limiter.is_enabled());
        assert_eq!(state.config.store.backend, StoreBackend::Mock);
        assert_eq!(state.registry.list_locations("s1").unwrap(), None);
    }
}
