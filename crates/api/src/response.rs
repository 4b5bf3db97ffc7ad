//! Response envelope and error mapping.
//!
//! Every catalog operation answers with the same envelope:
//! `{success, message, data?, error?, timestamp}`. Failures map each
//! [`CatalogError`] to a status code and its stable wire code; internal
//! detail is logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cakewalk_catalog::CatalogError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The uniform response envelope for catalog operations.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Operation result, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Stable error code on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Builds a success envelope carrying `data`.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Builds a success envelope with no payload.
    #[must_use]
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Builds a failure envelope with a stable error code.
    #[must_use]
    pub fn failure(message: impl Into<String>, code: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(code.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Handler-level error: wraps [`CatalogError`] so `?` works in handlers
/// while the envelope rendering stays in one place.
#[derive(Debug)]
pub struct ApiError(
    /// The underlying catalog failure.
    pub CatalogError,
);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            CatalogError::Validation(_) | CatalogError::MissingId => StatusCode::BAD_REQUEST,
            CatalogError::DuplicateTitle(_) | CatalogError::DuplicateId(_) => StatusCode::CONFLICT,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Non-exhaustive enum: anything unclassified is an internal error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Full detail is logged; the caller sees a generic message
            tracing::error!(error = %err, code = err.code(), "catalog operation failed");
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        let body = ApiResponse::<serde_json::Value>::failure(message, err.code());
        (status, Json(body)).into_response()
    }
}
