//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error renders as a JSON body of the shape `{"error": "..."}`, which
//! is what the browser front end expects from every endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::inventory::AdjustError;
use crate::jsonbin::BinStoreError;
use crate::services::stripe::StripeError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Bin store error: {0}")]
    Bins(#[from] BinStoreError),

    /// Stock adjustment failed.
    #[error("Inventory error: {0}")]
    Inventory(#[from] AdjustError),

    /// Stripe API operation failed.
    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream rejected our credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upstream data is unavailable.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the underlying bin-store failure was an auth rejection.
    const fn is_upstream_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Bins(BinStoreError::Api { status: 401, .. })
                | Self::Inventory(AdjustError::Store(BinStoreError::Api { status: 401, .. }))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry (client-caused adjust failures are not)
        if matches!(
            self,
            Self::Bins(_)
                | Self::Stripe(_)
                | Self::Internal(_)
                | Self::Inventory(AdjustError::Store(_) | AdjustError::Parse(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Bins(_) | Self::Inventory(_) if self.is_upstream_auth_failure() => {
                StatusCode::UNAUTHORIZED
            }
            Self::Bins(_) | Self::Stripe(_) => StatusCode::BAD_GATEWAY,
            Self::Inventory(err) => match err {
                AdjustError::ProductNotFound => StatusCode::NOT_FOUND,
                AdjustError::MissingRouting
                | AdjustError::MissingProductId
                | AdjustError::UnwritableBin(_) => StatusCode::BAD_REQUEST,
                AdjustError::Store(_) => StatusCode::BAD_GATEWAY,
                AdjustError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Bins(_) | Self::Inventory(_) if self.is_upstream_auth_failure() => {
                "Authentication failed. Please check the API key and bin ownership.".to_string()
            }
            Self::Bins(_) => "Document store error".to_string(),
            Self::Stripe(_) => "Payment system error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Inventory(err) => match err {
                AdjustError::ProductNotFound
                | AdjustError::MissingRouting
                | AdjustError::MissingProductId
                | AdjustError::UnwritableBin(_) => err.to_string(),
                AdjustError::Store(_) => "Document store error".to_string(),
                AdjustError::Parse(_) => "Internal server error".to_string(),
            },
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Unauthorized(msg)
            | Self::Unavailable(msg) => msg.clone(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
