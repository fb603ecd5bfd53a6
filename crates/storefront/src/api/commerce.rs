//! Commerce REST API client: products, authentication, orders.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use linen_core::{Email, Price, ProductId};

use crate::api::{ApiError, OrderGateway, decode_envelope};
use crate::cart::ProductRef;
use crate::checkout::order::{OrderConfirmation, OrderPayload};
use crate::config::CommerceApiConfig;
use crate::models::session::CurrentUser;

/// Cached values, keyed by request.
#[derive(Clone)]
enum CacheValue {
    Product(Arc<Product>),
    Products(Arc<Vec<Product>>),
}

/// Client for the commerce REST API.
///
/// Products are cached for 5 minutes; orders and authentication always
/// hit the network.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base: String,
    token: String,
    cache: Cache<String, CacheValue>,
}

/// A catalog product as the backend returns it.
///
/// Prices are optional on the wire; the backend omits them for draft
/// products. [`Product::to_ref`] defaults missing prices to zero so a
/// half-published product can never poison cart arithmetic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sale_price: Option<Price>,
    #[serde(default)]
    pub original_price: Option<Price>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl Product {
    /// Reduce to the copy the cart stores.
    #[must_use]
    pub fn to_ref(&self) -> ProductRef {
        ProductRef {
            id: self.id.clone(),
            title: self.title.clone(),
            slug: self.slug.clone(),
            images: self.images.clone(),
            sale_price: self.sale_price.unwrap_or(Price::ZERO),
            original_price: self.original_price.unwrap_or(Price::ZERO),
            sizes: self.sizes.clone(),
        }
    }
}

/// Login request body.
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// User identity as the backend returns it.
#[derive(Debug, Deserialize)]
struct UserDto {
    id: linen_core::UserId,
    name: String,
    email: String,
}

impl CommerceClient {
    /// Create a new commerce API client.
    #[must_use]
    pub fn new(config: &CommerceApiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                base: config.base_url.as_str().trim_end_matches('/').to_owned(),
                token: config.token.expose_secret().to_owned(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .bearer_auth(&self.inner.token)
            .send()
            .await?;
        decode_envelope(response).await
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .bearer_auth(&self.inner.token)
            .json(body)
            .send()
            .await?;
        decode_envelope(response).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Get a product by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product");
            return Ok((*product).clone());
        }

        let product: Product = self.get_json(&format!("/products/{slug}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Arc::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List the products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category does not exist or the request fails.
    #[instrument(skip(self), fields(category = %category_slug))]
    pub async fn get_products_by_category(
        &self,
        category_slug: &str,
    ) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("category:{category_slug}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for category products");
            return Ok((*products).clone());
        }

        let products: Vec<Product> = self
            .get_json(&format!("/categories/{category_slug}/products"))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::new(products.clone())))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Authenticate a customer and return their identity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] for bad credentials and transport
    /// or parse errors otherwise.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, ApiError> {
        let user: UserDto = self
            .post_json("/auth/login", &LoginRequest { email, password })
            .await?;

        let email = Email::parse(&user.email)
            .map_err(|e| ApiError::Unexpected(format!("invalid email in login response: {e}")))?;

        Ok(CurrentUser {
            id: user.id,
            name: user.name,
            email,
        })
    }
}

impl OrderGateway for CommerceClient {
    /// Create an order on the backend.
    ///
    /// Never cached, never retried here; the checkout sequencer owns the
    /// retry policy (keep state, let the customer resubmit).
    #[instrument(skip(self, payload))]
    async fn submit_order(&self, payload: &OrderPayload) -> Result<OrderConfirmation, ApiError> {
        self.post_json("/orders", payload).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_to_ref_defaults_missing_prices_to_zero() {
        let product: Product = serde_json::from_str(
            r#"{"id":"p1","title":"Linen Shirt","slug":"linen-shirt","sizes":["M"]}"#,
        )
        .unwrap();

        let reduced = product.to_ref();
        assert_eq!(reduced.sale_price, Price::ZERO);
        assert_eq!(reduced.original_price, Price::ZERO);
        assert!(reduced.images.is_empty());
    }

    #[test]
    fn test_product_deserializes_camel_case() {
        let product: Product = serde_json::from_str(
            r#"{"id":"p1","title":"T","slug":"t","salePrice":129000,"originalPrice":159000,"images":["a.jpg"],"sizes":["S","M"]}"#,
        )
        .unwrap();

        assert_eq!(product.to_ref().sale_price, Price::from(129_000));
        assert_eq!(product.sizes, vec!["S", "M"]);
    }
}
