//! Cart route handlers.
//!
//! The cart lives in the session; every handler rebuilds a `CartStore`
//! from session storage, mutates it, and returns a JSON view. Fragments
//! are small on purpose - the front end swaps them in place.

use axum::{Form, extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use linen_core::ProductId;

use crate::cart::{AddDestination, CartItem, CartStore};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::storage::{KeyValueStorage, SessionStorage};

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub size: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            slug: item.product.slug.clone(),
            title: item.product.title.clone(),
            image: item.product.images.first().cloned(),
            size: item.size.clone(),
            quantity: item.quantity,
            price: item.product.sale_price.to_string(),
            line_total: item.line_total().to_string(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub count: u32,
}

impl CartView {
    fn build<S: KeyValueStorage>(cart: &CartStore<S>) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: cart.total().to_string(),
            count: cart.count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    pub size: String,
    pub quantity: Option<u32>,
    /// Navigate straight to the cart page instead of the mini-cart.
    #[serde(default)]
    pub buy_now: bool,
    /// Client hint: viewport too small for the mini-cart overlay.
    #[serde(default)]
    pub compact_viewport: bool,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    pub size: String,
}

/// Response for an add-to-cart call.
#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    /// Where the front end should send the customer, absent when the
    /// call was debounced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<AddDestination>,
    /// True when the call was dropped as a duplicate double-invocation.
    pub deduplicated: bool,
    pub cart: CartView,
}

/// Debounce scope for this session. Sessions without an ID yet (first
/// request) share the empty scope; they cannot have a duplicate anyway.
fn guard_scope(session: &Session) -> String {
    session.id().map(|id| id.to_string()).unwrap_or_default()
}

/// Display cart contents.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    let cart = CartStore::load(SessionStorage::new(session)).await;
    Json(CartView::build(&cart))
}

/// Add an item to the cart.
///
/// Fetches the product by slug so the cart stores a reduced copy of
/// real catalog data, never client-supplied prices. Rapid duplicate
/// calls for the same `(product, size)` pair are debounced.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Json<AddToCartResponse>> {
    let product = state.commerce().get_product_by_slug(&form.slug).await?;

    if !product.sizes.is_empty() && !product.sizes.contains(&form.size) {
        return Err(AppError::BadRequest(format!(
            "size {:?} is not offered for this product",
            form.size
        )));
    }

    let scope = guard_scope(&session);
    let mut cart = CartStore::load(SessionStorage::new(session)).await;

    if !state.add_guard().admit(&scope, &product.id, &form.size) {
        tracing::debug!(product_id = %product.id, size = %form.size, "duplicate add debounced");
        return Ok(Json(AddToCartResponse {
            destination: None,
            deduplicated: true,
            cart: CartView::build(&cart),
        }));
    }

    let destination = cart
        .add_to_cart(
            product.to_ref(),
            form.size,
            form.quantity.unwrap_or(1),
            form.buy_now,
            form.compact_viewport,
        )
        .await;

    Ok(Json(AddToCartResponse {
        destination: Some(destination),
        deduplicated: false,
        cart: CartView::build(&cart),
    }))
}

/// Update a line's quantity.
///
/// Quantities below one are ignored; the front end maps a decrement
/// from one to an explicit remove instead.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Json<CartView> {
    let mut cart = CartStore::load(SessionStorage::new(session)).await;
    cart.update_quantity(&form.product_id, &form.size, form.quantity)
        .await;
    Json(CartView::build(&cart))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Json<CartView> {
    let mut cart = CartStore::load(SessionStorage::new(session)).await;
    cart.remove_from_cart(&form.product_id, &form.size).await;
    Json(CartView::build(&cart))
}

/// Cart count badge value.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Get the cart count badge value.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Json<CartCount> {
    let cart = CartStore::load(SessionStorage::new(session)).await;
    Json(CartCount {
        count: cart.count(),
    })
}
