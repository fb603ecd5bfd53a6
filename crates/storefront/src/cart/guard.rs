//! Duplicate add-to-cart guard.
//!
//! UI re-render quirks can fire the add handler twice for one click.
//! This guard drops the second invocation when the same `(scope,
//! product, size)` key arrives within a short window. It is a debounce
//! against double-invocation, not a business rule: distinct products or
//! sizes are never debounced against each other, and a legitimate
//! re-add after the window merges normally in the cart.
//!
//! The scope is the caller's session identity so one customer's rapid
//! clicks never throttle another's.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use linen_core::ProductId;

/// Default debounce window.
const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GuardKey {
    scope: String,
    product_id: ProductId,
    size: String,
}

/// Debounce guard for rapid duplicate add-to-cart calls.
#[derive(Debug)]
pub struct DuplicateAddGuard {
    window: Duration,
    seen: Mutex<HashMap<GuardKey, Instant>>,
}

impl Default for DuplicateAddGuard {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl DuplicateAddGuard {
    /// Create a guard with a custom window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an add for this key should proceed right now.
    ///
    /// Records the key when admitted; a repeat within the window is
    /// rejected.
    pub fn admit(&self, scope: &str, product_id: &ProductId, size: &str) -> bool {
        self.admit_at(scope, product_id, size, Instant::now())
    }

    /// [`admit`](Self::admit) with an explicit clock instant, for tests.
    pub fn admit_at(&self, scope: &str, product_id: &ProductId, size: &str, now: Instant) -> bool {
        let key = GuardKey {
            scope: scope.to_owned(),
            product_id: product_id.clone(),
            size: size.to_owned(),
        };

        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);

        // Expired entries would otherwise accumulate per (session, product, size).
        let window = self.window;
        seen.retain(|_, at| now.saturating_duration_since(*at) < window);

        match seen.get(&key) {
            Some(at) if now.saturating_duration_since(*at) < window => false,
            _ => {
                seen.insert(key, now);
                true
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId::new(s)
    }

    #[test]
    fn test_rejects_repeat_within_window() {
        let guard = DuplicateAddGuard::default();
        let t0 = Instant::now();

        assert!(guard.admit_at("s1", &pid("p1"), "M", t0));
        assert!(!guard.admit_at("s1", &pid("p1"), "M", t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_admits_after_window_elapses() {
        let guard = DuplicateAddGuard::default();
        let t0 = Instant::now();

        assert!(guard.admit_at("s1", &pid("p1"), "M", t0));
        assert!(guard.admit_at("s1", &pid("p1"), "M", t0 + Duration::from_millis(600)));
    }

    #[test]
    fn test_distinct_keys_never_debounced() {
        let guard = DuplicateAddGuard::default();
        let t0 = Instant::now();

        assert!(guard.admit_at("s1", &pid("p1"), "M", t0));
        // Different size, different product, different session: all admitted
        assert!(guard.admit_at("s1", &pid("p1"), "L", t0));
        assert!(guard.admit_at("s1", &pid("p2"), "M", t0));
        assert!(guard.admit_at("s2", &pid("p1"), "M", t0));
    }

    #[test]
    fn test_admission_rearms_the_window() {
        let guard = DuplicateAddGuard::new(Duration::from_millis(500));
        let t0 = Instant::now();

        assert!(guard.admit_at("s1", &pid("p1"), "M", t0));
        let t1 = t0 + Duration::from_millis(600);
        assert!(guard.admit_at("s1", &pid("p1"), "M", t1));
        // The second admission started a new window
        assert!(!guard.admit_at("s1", &pid("p1"), "M", t1 + Duration::from_millis(100)));
    }
}
