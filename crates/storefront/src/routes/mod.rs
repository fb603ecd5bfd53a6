//! HTTP route handlers for the storefront.
//!
//! # Route table
//!
//! | Method | Path                                   | Handler                          |
//! |--------|----------------------------------------|----------------------------------|
//! | GET    | `/products/{slug}`                     | `products::show`                 |
//! | GET    | `/categories/{slug}/products`          | `products::by_category`          |
//! | GET    | `/cart`                                | `cart::show`                     |
//! | GET    | `/cart/count`                          | `cart::count`                    |
//! | POST   | `/cart/items`                          | `cart::add`                      |
//! | POST   | `/cart/items/update`                   | `cart::update`                   |
//! | POST   | `/cart/items/remove`                   | `cart::remove`                   |
//! | GET    | `/checkout`                            | `checkout::show`                 |
//! | POST   | `/checkout/shipping-info`              | `checkout::submit_shipping_info` |
//! | POST   | `/checkout/shipping-method`            | `checkout::submit_shipping_method` |
//! | POST   | `/checkout/payment-method`             | `checkout::submit_payment_method` |
//! | POST   | `/checkout/back`                       | `checkout::back`                 |
//! | POST   | `/checkout/confirm`                    | `checkout::confirm`              |
//! | GET    | `/address/provinces`                   | `checkout::provinces`            |
//! | GET    | `/address/provinces/{code}/districts`  | `checkout::districts`            |
//! | GET    | `/address/districts/{code}/wards`      | `checkout::wards`                |
//! | POST   | `/auth/login`                          | `auth::login`                    |
//! | GET    | `/auth/me`                             | `auth::me`                       |
//! | POST   | `/auth/logout`                         | `auth::logout`                   |

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products/{slug}", get(products::show))
        .route("/categories/{slug}/products", get(products::by_category))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/count", get(cart::count))
        .route("/cart/items", post(cart::add))
        .route("/cart/items/update", post(cart::update))
        .route("/cart/items/remove", post(cart::remove))
}

fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(checkout::show))
        .route("/checkout/shipping-info", post(checkout::submit_shipping_info))
        .route(
            "/checkout/shipping-method",
            post(checkout::submit_shipping_method),
        )
        .route(
            "/checkout/payment-method",
            post(checkout::submit_payment_method),
        )
        .route("/checkout/back", post(checkout::back))
        .route("/checkout/confirm", post(checkout::confirm))
        .route("/address/provinces", get(checkout::provinces))
        .route(
            "/address/provinces/{code}/districts",
            get(checkout::districts),
        )
        .route("/address/districts/{code}/wards", get(checkout::wards))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
}

/// Build the full storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(product_routes())
        .merge(cart_routes())
        .merge(checkout_routes())
        .merge(auth_routes())
}
