//! Durable key-value storage for cart and checkout state.
//!
//! The cart and the checkout draft must survive page reloads, so every
//! mutation is written through a small key-value interface. Two
//! implementations exist: [`SessionStorage`] (tower-sessions backed,
//! used by the HTTP layer) and [`MemoryStorage`] (used by tests and
//! non-HTTP embeddings).
//!
//! # Contract
//!
//! - Values are stored as JSON strings inside a versioned envelope
//!   (`{"version": 1, "data": ...}`) so the schema can migrate later.
//! - Reads degrade: a missing key, unparseable value, wrong envelope
//!   version, or wrong data shape all yield the caller's default. A
//!   corrupt cart must never take the storefront down.
//! - Write failures are logged at WARN and swallowed; persistence
//!   problems never block the shopping flow.

mod memory;
mod session;

pub use memory::MemoryStorage;
pub use session::SessionStorage;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current version tag written into every stored envelope.
const SCHEMA_VERSION: u32 = 1;

/// Storage keys used by the storefront core.
pub mod keys {
    /// Key for the persisted cart item list.
    pub const CART_ITEMS: &str = "cart_items";

    /// Key for the persisted checkout draft (includes the current step).
    pub const CHECKOUT_DRAFT: &str = "checkout_draft";
}

/// Errors from the underlying storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Raw string-keyed storage.
///
/// Futures are explicitly `Send` so generic callers compose with axum
/// handlers.
pub trait KeyValueStorage: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn get_raw(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Write a raw value under `key`, replacing any previous value.
    fn put_raw(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete the value stored under `key`. Deleting a missing key is fine.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Versioned wrapper around every stored payload.
#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Load a value, falling back to `T::default()` on any malformed read.
///
/// Legacy or corrupt values (the literal string `undefined`, invalid
/// JSON, an envelope of the wrong version or shape) are treated exactly
/// like a missing key.
pub async fn load_or_default<T, S>(storage: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStorage,
{
    let raw = match storage.get_raw(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::debug!(key, error = %e, "storage read failed, using default");
            return T::default();
        }
    };

    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.version == SCHEMA_VERSION => envelope.data,
        Ok(envelope) => {
            tracing::debug!(key, version = envelope.version, "unknown schema version, using default");
            T::default()
        }
        Err(e) => {
            tracing::debug!(key, error = %e, "malformed stored value, using default");
            T::default()
        }
    }
}

/// Persist a value under `key`, logging (not propagating) failures.
pub async fn store<T, S>(storage: &S, key: &str, value: &T)
where
    T: Serialize,
    S: KeyValueStorage,
{
    let envelope = Envelope {
        version: SCHEMA_VERSION,
        data: value,
    };

    let raw = match serde_json::to_string(&envelope) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to serialize value for storage");
            return;
        }
    };

    if let Err(e) = storage.put_raw(key, raw).await {
        tracing::warn!(key, error = %e, "failed to persist value");
    }
}

/// Erase the value stored under `key`, logging (not propagating) failures.
pub async fn erase<S: KeyValueStorage>(storage: &S, key: &str) {
    if let Err(e) = storage.remove(key).await {
        tracing::warn!(key, error = %e, "failed to erase stored value");
    }
}
