//! Durable client storage port.
//!
//! All durable state (the token pair and the cart snapshot) flows through
//! the [`Storage`] trait so tests can substitute [`MemoryStorage`] for the
//! real [`FileStorage`]. Keys are namespaced string slots; each slot is
//! owned exclusively by one manager and no other component writes to it.
//!
//! There is no cross-process coordination: two clients sharing one storage
//! file follow last-write-wins semantics.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Storage slot names.
pub mod keys {
    /// Access token (opaque bearer string). Owned by the session manager.
    pub const ACCESS_TOKEN: &str = "auth.token";
    /// Refresh token (opaque string). Owned by the session manager.
    pub const REFRESH_TOKEN: &str = "auth.refresh_token";
    /// Serialized cart line items. Owned by the cart store.
    pub const CART: &str = "cart";
}

/// Errors that can occur in a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the backing file failed.
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable key-value storage for client state.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a slot (test setup helper).
    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// File-backed storage: one JSON object per storage file.
///
/// The whole map is held in memory and written through on every mutation.
/// A corrupt file degrades to an empty map rather than failing startup;
/// the managers layered on top already treat missing slots as "no saved
/// state".
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) the storage file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or an
    /// existing file cannot be read. A file that exists but fails to parse
    /// is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "storage file is corrupt, starting empty"
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// The path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full map to disk via a temp file + rename so a crash
    /// mid-write never truncates the previous snapshot.
    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("json.tmp");
        let serialized = serde_json::to_vec_pretty(entries)?;

        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(&serialized)?;
        file.sync_all()?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.put("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));

        storage.put("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v2".to_string()));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_remove_absent_is_noop() {
        let storage = MemoryStorage::new();
        assert!(storage.remove("missing").is_ok());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("sartoria-test-{}", std::process::id()));
        let path = dir.join("roundtrip.json");
        let _ = std::fs::remove_file(&path);

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.put(keys::ACCESS_TOKEN, "tok-1").unwrap();
            storage.put(keys::CART, "[]").unwrap();
        }

        // Reopen and observe persisted values
        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(
            storage.get(keys::ACCESS_TOKEN).unwrap(),
            Some("tok-1".to_string())
        );
        assert_eq!(storage.get(keys::CART).unwrap(), Some("[]".to_string()));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_storage_corrupt_file_degrades_to_empty() {
        let dir = std::env::temp_dir().join(format!("sartoria-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("corrupt.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
