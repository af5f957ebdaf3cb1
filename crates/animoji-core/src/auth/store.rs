//! Durable key-value storage for the persisted token record.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

/// Storage key holding the raw bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Storage file name in cache directory
const STORAGE_FILE: &str = "storage.json";

/// Client-local durable storage, modeled on browser local storage.
///
/// Removing an absent key is not an error.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores entries as a JSON object in a single file.
pub struct FileStore {
    cache_dir: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(STORAGE_FILE)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read storage file")?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse storage file")
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let path = self.path();
        if entries.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove storage file")?;
            }
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&path, contents).context("Failed to write storage file")?;
        Ok(())
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            debug!(error = %e, "Discarding unreadable storage file");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                debug!(error = %e, "Discarding unreadable storage file");
                BTreeMap::new()
            }
        };
        entries.remove(key);
        self.write_entries(&entries)
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an entry, e.g. to simulate a record left by an earlier run
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .lock()
            .insert(key.to_string(), value.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
        store.set(AUTH_TOKEN_KEY, "abc").expect("set");
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), Some("abc".to_string()));

        // A second handle on the same directory sees the entry
        let reopened = FileStore::new(dir.path().join("nested"));
        assert_eq!(reopened.get(AUTH_TOKEN_KEY).expect("get"), Some("abc".to_string()));
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().to_path_buf());

        store.set("theme", "dark").expect("set");
        store.set(AUTH_TOKEN_KEY, "abc").expect("set");
        store.remove(AUTH_TOKEN_KEY).expect("remove");

        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
        assert_eq!(store.get("theme").expect("get"), Some("dark".to_string()));
    }

    #[test]
    fn test_file_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().to_path_buf());

        store.remove(AUTH_TOKEN_KEY).expect("remove absent");
        store.set(AUTH_TOKEN_KEY, "abc").expect("set");
        store.remove(AUTH_TOKEN_KEY).expect("remove");
        store.remove(AUTH_TOKEN_KEY).expect("remove again");
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_recovers_from_garbage_on_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), "{not json").expect("write");

        assert!(store.get(AUTH_TOKEN_KEY).is_err());
        store.set(AUTH_TOKEN_KEY, "abc").expect("set overwrites garbage");
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), Some("abc".to_string()));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_entry(AUTH_TOKEN_KEY, "abc");
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), Some("abc".to_string()));
        store.remove(AUTH_TOKEN_KEY).expect("remove");
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
        store.remove(AUTH_TOKEN_KEY).expect("remove again");
    }
}
