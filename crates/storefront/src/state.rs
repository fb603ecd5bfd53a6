//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::api::{AddressClient, CommerceClient};
use crate::cart::DuplicateAddGuard;
use crate::checkout::SubmissionGuard;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the remote API
/// clients, the session pool, and the two request guards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    commerce: CommerceClient,
    addresses: AddressClient,
    add_guard: DuplicateAddGuard,
    submissions: SubmissionGuard,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: SqlitePool) -> Self {
        let commerce = CommerceClient::new(&config.commerce);
        let addresses = AddressClient::new(&config.address);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                commerce,
                addresses,
                add_guard: DuplicateAddGuard::default(),
                submissions: SubmissionGuard::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session database pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the address lookup client.
    #[must_use]
    pub fn addresses(&self) -> &AddressClient {
        &self.inner.addresses
    }

    /// Get a reference to the duplicate add-to-cart guard.
    #[must_use]
    pub fn add_guard(&self) -> &DuplicateAddGuard {
        &self.inner.add_guard
    }

    /// Get a reference to the order submission guard.
    #[must_use]
    pub fn submissions(&self) -> &SubmissionGuard {
        &self.inner.submissions
    }
}
