//! Clients for the remote commerce REST API.
//!
//! The storefront owns no catalog or order data; everything comes from a
//! remote REST backend that wraps payloads in a `{success, data}`
//! envelope. Two clients live here:
//!
//! - [`CommerceClient`] - products, authentication, order creation
//! - [`AddressClient`] - province/district/ward cascading lookups
//!
//! Read-mostly lookups are cached with `moka` (5-minute TTL). Errors are
//! always caught and typed; nothing here panics or propagates an
//! unhandled rejection into the route layer.

mod address;
mod commerce;

pub use address::{AddressClient, Division};
pub use commerce::{CommerceClient, Product};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::checkout::order::{OrderConfirmation, OrderPayload};

/// Errors from the remote commerce or address APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON for the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend answered with `success: false`.
    #[error("rejected by the API: {0}")]
    Rejected(String),

    /// The backend answered with a shape we don't understand.
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// The backend's standard `{success, data, message}` envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope into a result.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when `success` is false and
    /// [`ApiError::Unexpected`] when a successful envelope carries no
    /// data.
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "no error message provided".to_owned()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Unexpected("success response without data".to_owned()))
    }
}

/// The seam the checkout sequencer submits orders through.
///
/// [`CommerceClient`] is the production implementation; tests stub this
/// to exercise success and failure paths without a network.
pub trait OrderGateway: Send + Sync {
    /// Create an order on the backend.
    fn submit_order(
        &self,
        payload: &OrderPayload,
    ) -> impl Future<Output = Result<OrderConfirmation, ApiError>> + Send;
}

/// Decode a response body, honoring rate-limit headers and the envelope.
///
/// Shared by both clients. Reads the body as text first so parse
/// failures can log a useful excerpt.
pub(crate) async fn decode_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited(retry_after));
    }

    let body = response.text().await?;

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(excerpt(&body)));
    }

    if !status.is_success() {
        tracing::error!(status = %status, body = %excerpt(&body), "commerce API returned non-success status");
        return Err(ApiError::Unexpected(format!("HTTP {status}: {}", excerpt(&body))));
    }

    let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
        tracing::error!(error = %e, body = %excerpt(&body), "failed to parse commerce API response");
        ApiError::Parse(e)
    })?;

    envelope.into_result()
}

fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let envelope: ApiResponse<u32> = serde_json::from_str(r#"{"success":true,"data":7}"#).unwrap();
        assert_eq!(envelope.into_result().unwrap(), 7);
    }

    #[test]
    fn test_envelope_rejection_carries_message() {
        let envelope: ApiResponse<u32> =
            serde_json::from_str(r#"{"success":false,"message":"out of stock"}"#).unwrap();
        match envelope.into_result() {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "out of stock"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_success_without_data_is_unexpected() {
        let envelope: ApiResponse<u32> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(
            envelope.into_result(),
            Err(ApiError::Unexpected(_))
        ));
    }
}
