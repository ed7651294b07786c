//! JSON file document store

use crate::store::{decode_document, Document, DocumentStore, StoreError};
use log::{debug, info};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stores the whole document as one JSON file.
///
/// Saves write a sibling `.tmp` file, sync it and rename it over the target,
/// so readers never observe a half-written document.
pub struct JsonFileStore {
    path: PathBuf,
    temp_path: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `path`, creating the parent directory and an empty
    /// document if nothing exists there yet
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let temp_path = temp_path_for(&path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Unavailable {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let store = Self { path, temp_path };
        if !store.path.exists() {
            info!("Document file {} not found, seeding an empty document", store.path.display());
            store.save(&Document::new())?;
        }
        info!("Using document file: {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, source: std::io::Error) -> StoreError {
        StoreError::Unavailable {
            path: self.path.clone(),
            source,
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Best-effort fsync of the directory holding `path`, so the rename survives a crash
fn sync_parent_dir(path: &Path) -> bool {
    #[cfg(unix)]
    {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        if let Ok(dir) = File::open(parent) {
            return dir.sync_all().is_ok();
        }
        false
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        false
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Document, StoreError> {
        let bytes = fs::read(&self.path).map_err(|e| self.unavailable(e))?;
        let document = decode_document(&self.path, &bytes)?;
        debug!("Loaded {} server records from {}", document.len(), self.path.display());
        Ok(document)
    }

    fn save(&self, document: &Document) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(document)?;

        let mut file = File::create(&self.temp_path).map_err(|e| self.unavailable(e))?;
        file.write_all(&bytes).map_err(|e| self.unavailable(e))?;
        file.sync_all().map_err(|e| self.unavailable(e))?;
        drop(file);

        fs::rename(&self.temp_path, &self.path).map_err(|e| self.unavailable(e))?;
        if !sync_parent_dir(&self.path) {
            debug!("Could not sync directory of {}", self.path.display());
        }
        debug!("Saved {} server records to {}", document.len(), self.path.display());
        Ok(())
    }
}
