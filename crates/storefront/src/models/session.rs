//! Session-related types.
//!
//! Types stored in the session for authentication state. The identity
//! itself comes from the remote commerce API; the storefront only holds
//! the minimal copy needed to build order payloads.

use serde::{Deserialize, Serialize};

use linen_core::{Email, UserId};

/// Session-stored customer identity.
///
/// A valid `CurrentUser` is a hard precondition for order submission;
/// the checkout sequencer refuses to submit without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Remote API user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";
}
