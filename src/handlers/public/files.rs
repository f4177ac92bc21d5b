// handlers/public/files.rs - GET /files/*key, the target of signed URLs

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

/// Serve a stored object when the URL's signature is valid and unexpired.
pub async fn file_get(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now().timestamp();
    if !state.files.signer.verify(&key, query.expires, &query.signature, now) {
        return Err(ApiError::forbidden("Invalid or expired file URL"));
    }
    let body = state.files.store.get(&key).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], body))
}
