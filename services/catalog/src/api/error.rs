//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every catalog endpoint
//! answers failures with the same `{error, code}` body.
//!
//! # Key invariants and assumptions
//! - `code` is stable and machine-readable; `error` is human-readable.
//! - Status codes align with the error category. Title conflicts are
//!   client errors and answer 400, not 409.
//!
//! # Security considerations
//! - Store and media backend failures log details server-side and return a
//!   generic message.
use crate::api::types::ErrorResponse;
use crate::listing::ListingError;
use crate::listing::query::QueryError;
use crate::media::MediaError;
use crate::store::StoreError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
        },
    }
}

/// Build a 404 Not Found error.
pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 400 error for a uniqueness conflict.
pub fn api_conflict(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "conflict", message)
}

/// Build a 500 Internal Server Error from a store error.
///
/// Logs the store error; the response carries only `message`.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "catalog storage error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Build a 500 error for a failed media backend call.
pub fn api_upstream(message: &str, err: &MediaError) -> ApiError {
    tracing::error!(error = %err, "media backend error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream", message)
}

/// Build a 401 Unauthorized error.
pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Build a 403 Forbidden error.
pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Map a JSON extractor rejection (syntax, missing field, unknown enum value,
/// wrong content type) to a validation error.
pub fn api_bad_body(rejection: JsonRejection) -> ApiError {
    api_validation_error(&rejection.body_text())
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        api_validation_error(&err.to_string())
    }
}

impl From<ListingError> for ApiError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::Validation(err) => api_validation_error(&err.to_string()),
            ListingError::Forbidden(err) => api_forbidden(&err.to_string()),
            ListingError::NotFound(message) => api_not_found(&message),
            ListingError::Conflict(message) => api_conflict(&message),
            ListingError::Store(err) => api_internal("catalog storage failure", &err),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Validation(message) => api_validation_error(&message),
            MediaError::Forbidden(err) => api_forbidden(&err.to_string()),
            err @ MediaError::Upstream(_) => api_upstream("image upload failed", &err),
        }
    }
}
