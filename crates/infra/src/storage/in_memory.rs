use std::collections::HashMap;
use std::sync::RwLock;

use super::r#trait::{StorageBackend, StorageError, StorageKey};

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    inner: RwLock<HashMap<StorageKey, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw blob currently stored under `key`.
    pub fn raw(&self, key: StorageKey) -> Option<String> {
        self.inner.read().ok()?.get(&key).cloned()
    }
}

impl StorageBackend for InMemoryStorage {
    fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;
        Ok(map.get(&key).cloned())
    }

    fn save(&self, key: StorageKey, blob: &str) -> Result<(), StorageError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;
        map.insert(key, blob.to_string());
        Ok(())
    }
}
