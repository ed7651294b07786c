//! Document Storage Layer Abstraction
//!
//! The whole registry lives in one JSON document. This module provides the
//! interface every backend implements: load the full document, save the
//! full document. There is no partial access path.

pub mod file_store;
pub mod mock_store;

use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// The entire persisted state: server identifier -> raw server record
pub type Document = Map<String, Value>;

/// Errors raised while reading or writing the persisted document
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying medium could not be read or written
    #[error("document store at {path} is unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted bytes are not a JSON object
    #[error("document store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Trait defining the document storage interface
pub trait DocumentStore: Send + Sync {
    /// Read and decode the whole document
    fn load(&self) -> Result<Document, StoreError>;

    /// Encode and replace the whole document
    fn save(&self, document: &Document) -> Result<(), StoreError>;
}

/// Decode raw bytes into a document, rejecting anything that is not a JSON object
pub(crate) fn decode_document(path: &std::path::Path, bytes: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice::<Document>(bytes).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}
