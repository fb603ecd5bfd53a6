//! Session-backed storage used by the HTTP layer.
//!
//! Stores raw JSON strings in the tower-sessions session, which the
//! session layer persists to SQLite. Parsing of the versioned envelope
//! happens in [`super::load_or_default`] so malformed values degrade the
//! same way regardless of backend.

use tower_sessions::Session;

use super::{KeyValueStorage, StorageError};

/// Key-value storage backed by the request's session.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    session: Session,
}

impl SessionStorage {
    /// Wrap a request session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl KeyValueStorage for SessionStorage {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.session
            .get::<String>(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    async fn put_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.session
            .insert(key, value)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.session
            .remove::<String>(key)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::Backend(e.to_string()))
    }
}
