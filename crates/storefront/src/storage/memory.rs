//! In-memory storage for tests and non-HTTP embeddings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{KeyValueStorage, StorageError};

/// In-memory key-value storage.
///
/// Cheaply cloneable; clones share the same underlying map, which lets a
/// test hand one handle to a `CartStore` and another to a
/// `CheckoutSequencer` the way two HTTP handlers would share a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    map: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn put_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.lock().insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}
