//! API-boundary error type. Per spec.md §7, per-URL scrape failures are
//! data (a `ScrapeResult{status: "error", ...}`), never an HTTP error —
//! `ApiError` only covers the "abort the whole request" cases: bad auth,
//! a malformed body, or an unexpected internal failure.
//!
//! Grounded on `riptide-api::errors::ApiError`'s shape (a `thiserror` enum
//! with a `status_code()` match and an `IntoResponse` impl that wraps the
//! message in a small JSON envelope), trimmed to the handful of variants
//! this crate's routes actually raise.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
