//! Mock implementation of DocumentStore trait for testing

use crate::store::{Document, DocumentStore, StoreError};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// In-memory document store
pub struct MockDocumentStore {
    document: Arc<Mutex<Document>>,
}

impl MockDocumentStore {
    /// Create a new mock store holding an empty document
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    /// Create a mock store pre-populated with `document`
    pub fn with_document(document: Document) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
        }
    }

    /// Create a mock store from a JSON object literal; any other value yields an empty document
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::with_document(map),
            _ => Self::new(),
        }
    }

    /// Snapshot of the current document (useful for test assertions)
    pub fn snapshot(&self) -> Document {
        self.document.lock().clone()
    }

    /// Clear all data from the store
    pub fn clear(&self) {
        self.document.lock().clear();
    }

    /// Get the number of server records in the store
    pub fn server_count(&self) -> usize {
        self.document.lock().len()
    }
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MockDocumentStore {
    fn load(&self) -> Result<Document, StoreError> {
        Ok(self.document.lock().clone())
    }

    fn save(&self, document: &Document) -> Result<(), StoreError> {
        *self.document.lock() = document.clone();
        Ok(())
    }
}
