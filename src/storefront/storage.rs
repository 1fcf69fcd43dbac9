//! Durable key/value storage for client-local state.
//!
//! Every accessor degrades to a no-op (or `None`) with a warning on failure:
//! losing a cached cart or profile is an inconvenience, not an error worth
//! surfacing to the customer.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// String key/value storage with localStorage-like semantics.
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<T: ClientStorage + ?Sized> ClientStorage for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// Reads and deserializes a stored JSON value; corrupt payloads are
/// discarded with a warning.
pub fn get_json<T: DeserializeOwned>(storage: &impl ClientStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding corrupt stored value");
            None
        }
    }
}

/// Serializes and stores a JSON value.
pub fn set_json<T: Serialize>(storage: &impl ClientStorage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => storage.set(key, &raw),
        Err(e) => warn!(key, error = %e, "Failed to serialize value for storage"),
    }
}

/// In-memory storage, used in tests and as a fallback when no durable
/// backend is available.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// File-backed storage: one JSON file per key under a base directory.
#[derive(Debug)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to create storage directory");
        }
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl ClientStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored value");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::write(self.path_for(key), value) {
            warn!(key, error = %e, "Failed to persist value");
        }
    }

    fn remove(&self, key: &str) {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(key, error = %e, "Failed to remove stored value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("missing"), None);

        storage.set("cart", r#"{"items":[]}"#);
        assert_eq!(storage.get("cart").as_deref(), Some(r#"{"items":[]}"#));

        storage.remove("cart");
        assert_eq!(storage.get("cart"), None);
    }

    #[test]
    fn file_storage_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        set_json(&storage, "profile", &vec!["a", "b"]);
        let restored: Vec<String> = get_json(&storage, "profile").unwrap();
        assert_eq!(restored, vec!["a", "b"]);

        storage.remove("profile");
        assert_eq!(storage.get("profile"), None);
    }

    #[test]
    fn corrupt_json_is_discarded_not_propagated() {
        let storage = MemoryStorage::new();
        storage.set("cart", "not json at all {");
        let restored: Option<Vec<String>> = get_json(&storage, "cart");
        assert_eq!(restored, None);
    }
}
