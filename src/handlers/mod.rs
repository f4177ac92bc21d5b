// handlers/mod.rs - three-tier handler layout
//
// Public (no token) → Protected (bearer token, per-route rule) → Elevated
// (administrator or maintainer rules).
//
// Handlers stay thin: open a request transaction, call a service, shape
// the JSON. Access checks happen in middleware before they run.

pub mod elevated;
pub mod protected;
pub mod public;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use crate::error::ApiError;

/// Multipart failures are the client's fault, or too big.
pub(crate) fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(err.body_text())
    } else {
        ApiError::bad_request(err.body_text())
    }
}
