//! Session middleware configuration.
//!
//! Sets up SQLite-backed sessions using tower-sessions. The session is
//! the storefront's only local persistence: it carries the cart, the
//! checkout draft, and the signed-in customer.

use sqlx::SqlitePool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "linen_session";

/// Session expiry time in seconds (30 days; carts should outlive a lunch break).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with a SQLite store.
#[must_use]
pub fn create_session_layer(
    pool: &SqlitePool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<SqliteStore> {
    // The sessions table is created via SqliteStore::migrate at startup
    let store = SqliteStore::new(pool.clone());

    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
