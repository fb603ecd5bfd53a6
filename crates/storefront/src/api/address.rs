//! Administrative-division lookup client.
//!
//! The shipping form cascades province -> district -> ward; each level
//! is fetched by the parent's division code. Lookup failures are
//! non-fatal: the route layer surfaces them as a dismissible banner and
//! the dependent selects stay empty until retried.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::{ApiError, decode_envelope};
use crate::config::AddressApiConfig;

/// One administrative division (province, district, or ward).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    /// Division code, the key for the next lookup level.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Client for the address lookup service.
///
/// Division lists change rarely, so every level is cached for 5 minutes.
#[derive(Clone)]
pub struct AddressClient {
    inner: Arc<AddressClientInner>,
}

struct AddressClientInner {
    client: reqwest::Client,
    base: String,
    cache: Cache<String, Arc<Vec<Division>>>,
}

impl AddressClient {
    /// Create a new address lookup client.
    #[must_use]
    pub fn new(config: &AddressApiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300))
            .build();

        Self {
            inner: Arc::new(AddressClientInner {
                client: reqwest::Client::new(),
                base: config.base_url.as_str().trim_end_matches('/').to_owned(),
                cache,
            }),
        }
    }

    async fn fetch(&self, cache_key: String, path: String) -> Result<Vec<Division>, ApiError> {
        if let Some(divisions) = self.inner.cache.get(&cache_key).await {
            debug!(key = %cache_key, "cache hit for divisions");
            return Ok((*divisions).clone());
        }

        let response = self
            .inner
            .client
            .get(format!("{}{path}", self.inner.base))
            .send()
            .await?;
        let divisions: Vec<Division> = decode_envelope(response).await?;

        self.inner
            .cache
            .insert(cache_key, Arc::new(divisions.clone()))
            .await;

        Ok(divisions)
    }

    /// List all provinces.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup service fails; callers display a
    /// dismissible banner and keep the form alive.
    #[instrument(skip(self))]
    pub async fn provinces(&self) -> Result<Vec<Division>, ApiError> {
        self.fetch("provinces".to_owned(), "/provinces".to_owned())
            .await
    }

    /// List the districts of a province.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup service fails.
    #[instrument(skip(self), fields(province = %province_code))]
    pub async fn districts(&self, province_code: &str) -> Result<Vec<Division>, ApiError> {
        self.fetch(
            format!("districts:{province_code}"),
            format!("/provinces/{province_code}/districts"),
        )
        .await
    }

    /// List the wards of a district.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup service fails.
    #[instrument(skip(self), fields(district = %district_code))]
    pub async fn wards(&self, district_code: &str) -> Result<Vec<Division>, ApiError> {
        self.fetch(
            format!("wards:{district_code}"),
            format!("/districts/{district_code}/wards"),
        )
        .await
    }
}
