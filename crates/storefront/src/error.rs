//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors
//! to Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; nothing here is fatal to the process, and
//! every failure path leaves the customer able to retry or navigate
//! back.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote commerce or address API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout sequencer rejected an operation.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error class belongs in Sentry.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Internal(_) => true,
            Self::Api(api) | Self::Checkout(CheckoutError::Submission(api)) => {
                // Rejections are business outcomes, not defects
                !matches!(api, ApiError::Rejected(_) | ApiError::NotFound(_))
            }
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Api(api) => api_status(api),
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                CheckoutError::SubmissionInFlight => StatusCode::CONFLICT,
                CheckoutError::Submission(api) => api_status(api),
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn api_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients; rejection
        // messages from the backend are user-facing and pass through.
        let body = match &self {
            Self::Checkout(CheckoutError::Validation(report)) => json!({
                "error": "validation failed",
                "fields": report.errors,
            }),
            Self::Api(ApiError::Rejected(msg))
            | Self::Checkout(CheckoutError::Submission(ApiError::Rejected(msg))) => {
                json!({ "error": msg })
            }
            Self::Api(_) | Self::Checkout(CheckoutError::Submission(_)) => {
                json!({ "error": "External service error" })
            }
            Self::Storage(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checkout::{CheckoutStep, validate_shipping_info};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::NotAuthenticated)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::SubmissionInFlight)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::WrongStep {
                current: CheckoutStep::ShippingInfo
            })),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_validation_error_is_unprocessable() {
        let report = validate_shipping_info(&crate::checkout::ShippingInfo::default());
        let err = AppError::Checkout(CheckoutError::Validation(report));
        assert_eq!(get_status(err), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
