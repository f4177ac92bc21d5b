// handlers/public/search.rs - GET /public/search handler

use axum::extract::State;

use crate::app::AppState;
use crate::database::connection::with_transaction;
use crate::database::models::search::SearchResult;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SearchService;

/// GET /public/search - published projects with masked locations replaced
/// by circles.
pub async fn search_get(State(state): State<AppState>) -> ApiResult<Vec<SearchResult>> {
    let results = with_transaction(&state.pool, None, |conn| {
        Box::pin(async move { SearchService::new(conn).public_search().await })
    })
    .await?;
    Ok(ApiResponse::success(results))
}
