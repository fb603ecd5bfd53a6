//! Catalog route handlers.
//!
//! Thin pass-through over the commerce API client; the 5-minute product
//! cache lives in the client, not here.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use tracing::instrument;

use linen_core::ProductId;

use crate::api::Product;
use crate::error::Result;
use crate::state::AppState;

/// Catalog product display data.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub images: Vec<String>,
    pub sale_price: String,
    pub original_price: String,
    pub sizes: Vec<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let prices = product.to_ref();
        Self {
            id: product.id,
            title: product.title,
            slug: product.slug,
            description: product.description,
            images: product.images,
            sale_price: prices.sale_price.to_string(),
            original_price: prices.original_price.to_string(),
            sizes: product.sizes,
        }
    }
}

/// Get a product by its URL slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let product = state.commerce().get_product_by_slug(&slug).await?;
    Ok(Json(product.into()))
}

/// List the products in a category.
#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ProductView>>> {
    let products = state.commerce().get_products_by_category(&slug).await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}
