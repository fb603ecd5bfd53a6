//! Client-persisted shopping cart.
//!
//! The cart is the authoritative client-side record of what the customer
//! intends to buy: an ordered list of (product, size, quantity) line
//! items. It guarantees at most one line per `(product id, size)` pair,
//! survives reloads through the [`storage`](crate::storage) layer, and
//! derives its totals on demand.

pub mod guard;

pub use guard::DuplicateAddGuard;

use serde::{Deserialize, Serialize};

use linen_core::{Price, ProductId};

use crate::storage::{self, KeyValueStorage, keys};

/// Reduced copy of a product, holding only the fields the cart and the
/// order payload need. Full catalog payloads never enter the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Remote API product identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Image URLs; the first one travels into the order payload.
    pub images: Vec<String>,
    /// Current selling price.
    pub sale_price: Price,
    /// Pre-discount price, shown struck through.
    pub original_price: Price,
    /// Size variants offered for this product.
    pub sizes: Vec<String>,
}

/// A single cart line.
///
/// Identity is the `(product.id, size)` pair; adding the same pair again
/// merges into this line instead of appending a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Reduced product copy.
    pub product: ProductRef,
    /// Selected size variant.
    pub size: String,
    /// Quantity, always `>= 1`.
    pub quantity: u32,
}

impl CartItem {
    /// Sale price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.sale_price * self.quantity
    }

    fn matches(&self, product_id: &ProductId, size: &str) -> bool {
        self.product.id == *product_id && self.size == size
    }
}

/// Where the caller should send the customer after an add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddDestination {
    /// Navigate to the full cart page (buy-now, or compact viewports
    /// where the overlay doesn't fit).
    CartPage,
    /// Open the inline mini-cart overlay.
    MiniCart,
}

/// The shopping cart, bound to a storage handle.
///
/// All mutations write through to storage immediately; there is no
/// separate save step. `last_added` is deliberately transient - it only
/// drives the post-add notification and is not persisted.
pub struct CartStore<S> {
    storage: S,
    items: Vec<CartItem>,
    last_added: Option<ProductRef>,
}

impl<S: KeyValueStorage> CartStore<S> {
    /// Restore the cart from storage.
    ///
    /// A missing or malformed stored value yields an empty cart; a
    /// corrupt cart never surfaces as an error.
    pub async fn load(storage: S) -> Self {
        let items = storage::load_or_default(&storage, keys::CART_ITEMS).await;
        Self {
            storage,
            items,
            last_added: None,
        }
    }

    /// Current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The most recently added product, for the post-add notification.
    #[must_use]
    pub fn last_added(&self) -> Option<&ProductRef> {
        self.last_added.as_ref()
    }

    /// Add `quantity` of `(product, size)` to the cart.
    ///
    /// Merges into the existing line when the `(product id, size)` pair
    /// is already present, otherwise appends a new line. A zero quantity
    /// is treated as one. Returns where the caller should send the
    /// customer next: the cart page for buy-now or compact viewports,
    /// the mini-cart overlay otherwise.
    pub async fn add_to_cart(
        &mut self,
        product: ProductRef,
        size: impl Into<String>,
        quantity: u32,
        buy_now: bool,
        compact_viewport: bool,
    ) -> AddDestination {
        let size = size.into();
        let quantity = quantity.max(1);

        match self
            .items
            .iter_mut()
            .find(|item| item.matches(&product.id, &size))
        {
            Some(item) => item.quantity += quantity,
            None => self.items.push(CartItem {
                product: product.clone(),
                size,
                quantity,
            }),
        }

        self.last_added = Some(product);
        self.persist().await;

        if buy_now || compact_viewport {
            AddDestination::CartPage
        } else {
            AddDestination::MiniCart
        }
    }

    /// Remove the line matching `(product_id, size)`. No-op if absent.
    pub async fn remove_from_cart(&mut self, product_id: &ProductId, size: &str) {
        let before = self.items.len();
        self.items.retain(|item| !item.matches(product_id, size));
        if self.items.len() != before {
            self.persist().await;
        }
    }

    /// Replace the quantity on the matching line.
    ///
    /// Quantities below one are ignored; removal is only ever the
    /// explicit [`remove_from_cart`](Self::remove_from_cart) operation.
    pub async fn update_quantity(&mut self, product_id: &ProductId, size: &str, quantity: u32) {
        if quantity < 1 {
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, size))
        {
            item.quantity = quantity;
            self.persist().await;
        }
    }

    /// Cart total: sum of sale price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Empty the cart and erase its persisted state.
    pub async fn clear(&mut self) {
        self.items.clear();
        self.last_added = None;
        storage::erase(&self.storage, keys::CART_ITEMS).await;
    }

    async fn persist(&self) {
        storage::store(&self.storage, keys::CART_ITEMS, &self.items).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn product(id: &str, sale_price: &str) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            slug: format!("product-{id}"),
            images: vec![format!("https://img.example/{id}.jpg")],
            sale_price: Price::new(sale_price.parse().unwrap()),
            original_price: Price::new(sale_price.parse().unwrap()),
            sizes: vec!["S".into(), "M".into(), "L".into()],
        }
    }

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap())
    }

    #[tokio::test]
    async fn test_add_same_pair_merges_quantities() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        let p1 = product("p1", "150000");

        cart.add_to_cart(p1.clone(), "M", 1, false, false).await;
        cart.add_to_cart(p1.clone(), "M", 2, false, false).await;

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total(), price("450000"));
    }

    #[tokio::test]
    async fn test_different_sizes_are_separate_lines() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;

        cart.add_to_cart(product("p1", "100"), "M", 1, false, false)
            .await;
        cart.add_to_cart(product("p2", "200"), "L", 1, false, false)
            .await;

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.count(), 2);
    }

    #[tokio::test]
    async fn test_same_product_different_size_not_merged() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        let p1 = product("p1", "100");

        cart.add_to_cart(p1.clone(), "M", 1, false, false).await;
        cart.add_to_cart(p1, "L", 1, false, false).await;

        assert_eq!(cart.items().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_cart_total_is_zero() {
        let cart = CartStore::load(MemoryStorage::new()).await;
        assert_eq!(cart.total(), Price::ZERO);
        assert_eq!(cart.count(), 0);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_below_one_is_noop() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        let p1 = product("p1", "100");
        cart.add_to_cart(p1.clone(), "M", 2, false, false).await;

        cart.update_quantity(&p1.id, "M", 0).await;
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_update_quantity_replaces() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        let p1 = product("p1", "100");
        cart.add_to_cart(p1.clone(), "M", 2, false, false).await;

        cart.update_quantity(&p1.id, "M", 5).await;
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total(), price("500"));
    }

    #[tokio::test]
    async fn test_remove_missing_pair_is_noop() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        cart.add_to_cart(product("p1", "100"), "M", 1, false, false)
            .await;

        cart.remove_from_cart(&ProductId::new("p9"), "M").await;
        cart.remove_from_cart(&ProductId::new("p1"), "XL").await;
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_deletes_line() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        let p1 = product("p1", "100");
        cart.add_to_cart(p1.clone(), "M", 3, false, false).await;

        cart.remove_from_cart(&p1.id, "M").await;
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_persists_and_restores() {
        let storage = MemoryStorage::new();
        {
            let mut cart = CartStore::load(storage.clone()).await;
            cart.add_to_cart(product("p1", "100"), "M", 2, false, false)
                .await;
        }

        let restored = CartStore::load(storage).await;
        assert_eq!(restored.items().len(), 1);
        assert_eq!(restored.items()[0].quantity, 2);
        // last_added is transient and must not survive a reload
        assert!(restored.last_added().is_none());
    }

    #[tokio::test]
    async fn test_restores_empty_from_malformed_storage() {
        for raw in ["undefined", "{broken", "\"not an array\"", "17"] {
            let storage = MemoryStorage::new();
            storage
                .put_raw(keys::CART_ITEMS, raw.to_string())
                .await
                .unwrap();

            let cart = CartStore::load(storage).await;
            assert!(cart.is_empty(), "expected empty cart for {raw:?}");
        }
    }

    #[tokio::test]
    async fn test_clear_erases_persisted_state() {
        let storage = MemoryStorage::new();
        let mut cart = CartStore::load(storage.clone()).await;
        cart.add_to_cart(product("p1", "100"), "M", 1, false, false)
            .await;

        cart.clear().await;
        assert!(cart.is_empty());
        assert_eq!(storage.get_raw(keys::CART_ITEMS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_records_last_added() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        let p1 = product("p1", "100");
        cart.add_to_cart(p1.clone(), "M", 1, false, false).await;
        assert_eq!(cart.last_added().map(|p| &p.id), Some(&p1.id));
    }

    #[tokio::test]
    async fn test_add_destination() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        let p = product("p1", "100");

        let dest = cart.add_to_cart(p.clone(), "M", 1, false, false).await;
        assert_eq!(dest, AddDestination::MiniCart);

        let dest = cart.add_to_cart(p.clone(), "M", 1, true, false).await;
        assert_eq!(dest, AddDestination::CartPage);

        let dest = cart.add_to_cart(p, "M", 1, false, true).await;
        assert_eq!(dest, AddDestination::CartPage);
    }

    #[tokio::test]
    async fn test_zero_quantity_add_counts_as_one() {
        let mut cart = CartStore::load(MemoryStorage::new()).await;
        cart.add_to_cart(product("p1", "100"), "M", 0, false, false)
            .await;
        assert_eq!(cart.items()[0].quantity, 1);
    }
}
