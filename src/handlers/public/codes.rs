// handlers/public/codes.rs - GET /codes handler

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::code::AllCodeSets;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::fetch_codes;

/// GET /codes - every code table the forms use, fetched concurrently.
pub async fn codes_get(State(state): State<AppState>) -> ApiResult<AllCodeSets> {
    let codes = fetch_codes(state.codes.as_ref()).await?;
    Ok(ApiResponse::success(codes))
}
