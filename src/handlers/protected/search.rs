// handlers/protected/search.rs - GET /search handler

use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::search::SearchResult;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SearchService;

/// GET /search - boundaries of the projects the caller can see.
pub async fn search_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<Vec<SearchResult>> {
    let caller = principal.clone();
    let results = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { SearchService::new(conn).search(&caller).await })
    })
    .await?;
    Ok(ApiResponse::success(results))
}
