//! Key-value persistence backends
//!
//! `Persistence` is the port standing in for browser local storage. The
//! memory backend is the default; the file backend keeps tokens across
//! process restarts.

use crate::error::{Error, Result, ResultExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Synchronous string key-value store
pub trait Persistence: Send + Sync {
    /// Read a value
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-memory persistence backend
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryPersistence {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Persistence for MemoryPersistence {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// On-disk document written by `FilePersistence`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredItems {
    #[serde(default)]
    items: HashMap<String, String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// JSON file persistence backend
///
/// Every write rewrites the whole file through a temp file and a rename.
#[derive(Debug)]
pub struct FilePersistence {
    path: PathBuf,
    items: RwLock<StoredItems>,
}

impl FilePersistence {
    /// Open a store at `path`, loading existing items if the file exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::storage(format!("Failed to read store file: {e}")))?;
            if contents.trim().is_empty() {
                StoredItems::default()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|e| Error::storage(format!("Failed to parse store file: {e}")))?
            }
        } else {
            StoredItems::default()
        };

        debug!("Opened token store at {}", path.display());

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the store was last written
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .updated_at
    }

    fn save(&self, items: &StoredItems) -> Result<()> {
        let contents = serde_json::to_string_pretty(items)
            .map_err(|e| Error::storage(format!("Failed to serialize store: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create store directory {}", parent.display())
                })?;
            }
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, &contents)
            .map_err(|e| Error::storage(format!("Failed to write store file: {e}")))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| Error::storage(format!("Failed to rename store file: {e}")))?;

        Ok(())
    }

    /// Apply `f` to a copy of the items and keep the copy only once it is
    /// on disk
    fn update(&self, f: impl FnOnce(&mut HashMap<String, String>) -> bool) -> Result<()> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = items.clone();
        if !f(&mut next.items) {
            return Ok(());
        }
        next.updated_at = Some(Utc::now());
        self.save(&next)?;
        *items = next;
        Ok(())
    }
}

impl Persistence for FilePersistence {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|items| items.remove(key).is_some())
    }
}
