//! Location registry service
//!
//! Drives the read-modify-write cycle over the document store. Every
//! operation, reads included, runs inside one process-wide critical section
//! so concurrent mutations serialize instead of overwriting each other.

pub mod query;
pub mod upsert;

#[cfg(test)]
mod comprehensive_test;

use log::{debug, info};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::store::{Document, DocumentStore, StoreError};

pub use query::Coordinate;

/// Result of an operation that may not find its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    NotFound,
}

/// Registry service that owns the store handle and the critical section
pub struct LocationRegistry {
    store: Arc<dyn DocumentStore>,
    dedupe_location_labels: bool,
    lock: Mutex<()>,
}

impl LocationRegistry {
    /// Create a new registry with injected store backend
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            dedupe_location_labels: false,
            lock: Mutex::new(()),
        }
    }

    /// Replace same-label locations on add instead of appending
    pub fn with_label_dedupe(mut self, enabled: bool) -> Self {
        self.dedupe_location_labels = enabled;
        self
    }

    /// Load, mutate, and save only when the mutation applied
    fn mutate<F>(&self, operation: &str, f: F) -> Result<Outcome, StoreError>
    where
        F: FnOnce(&mut Document) -> Result<Outcome, StoreError>,
    {
        let _guard = self.lock.lock();
        let mut document = self.store.load()?;
        let outcome = f(&mut document)?;
        if outcome == Outcome::Applied {
            self.store.save(&document)?;
        }
        debug!("{} finished with {:?}", operation, outcome);
        Ok(outcome)
    }

    pub fn add_location(&self, server_id: &str, coords: Value, location: &str, user_id: &str) -> Result<Outcome, StoreError> {
        let dedupe = self.dedupe_location_labels;
        let outcome = self.mutate("add-location", |doc| {
            upsert::add_location(doc, server_id, coords, location, user_id, dedupe)
        })?;
        info!("Added location {} for user {} on server {}", location, user_id, server_id);
        Ok(outcome)
    }

    pub fn add_user(&self, server_id: &str, user_id: &str) -> Result<Outcome, StoreError> {
        let outcome = self.mutate("add-user", |doc| upsert::add_user(doc, server_id, user_id))?;
        info!("Added user {} to server {}", user_id, server_id);
        Ok(outcome)
    }

    pub fn remove_user(&self, server_id: &str, user_id: &str) -> Result<Outcome, StoreError> {
        self.mutate("remove-user", |doc| upsert::remove_user(doc, server_id, user_id))
    }

    pub fn remove_location(&self, server_id: &str, user_id: &str, location: &str) -> Result<Outcome, StoreError> {
        self.mutate("remove-location", |doc| {
            upsert::remove_location(doc, server_id, user_id, location)
        })
    }

    /// List coordinates for a server; `None` if the server is unknown
    pub fn list_locations(&self, server_id: &str) -> Result<Option<Vec<Coordinate>>, StoreError> {
        let _guard = self.lock.lock();
        let document = self.store.load()?;
        Ok(query::list_locations(&document, server_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock_store::MockDocumentStore;
    use serde_json::json;

    /// Store whose every call fails, for error propagation checks
    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        fn load(&self) -> Result<Document, StoreError> {
            Err(StoreError::Unavailable {
                path: "broken.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }

        fn save(&self, _document: &Document) -> Result<(), StoreError> {
            self.load().map(|_| ())
        }
    }

    #[test]
    fn test_not_found_does_not_persist() {
        let store = Arc::new(MockDocumentStore::from_json(json!({"s1": "legacy junk"})));
        let registry = LocationRegistry::new(store.clone());

        assert_eq!(registry.remove_user("s1", "u1").unwrap(), Outcome::NotFound);
        assert_eq!(store.snapshot()["s1"], json!("legacy junk"));
    }

    #[test]
    fn test_store_errors_propagate() {
        let registry = LocationRegistry::new(Arc::new(BrokenStore));

        assert!(matches!(registry.add_user("s1", "u1"), Err(StoreError::Unavailable { .. })));
        assert!(matches!(registry.list_locations("s1"), Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_label_dedupe_option() {
        let store = Arc::new(MockDocumentStore::new());
        let registry = LocationRegistry::new(store.clone()).with_label_dedupe(true);

        registry.add_location("s1", json!(1), "A", "u1").unwrap();
        registry.add_location("s1", json!(2), "A", "u1").unwrap();

        let items = registry.list_locations("s1").unwrap().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].coords, json!(2));
    }
}
