// handlers/protected/spatial.rs - coordinate conversion and region lookup

use axum::extract::{Extension, Json, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::spatial_service::{PointRequest, PointResponse};
use crate::services::SpatialService;

#[derive(Debug, Deserialize)]
pub struct RegionRequest {
    pub features: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct RegionResponse {
    pub regions: Vec<String>,
}

/// POST /spatial/point - `{ coordinates: "<lat> <long>" | "<utm>" }` to a
/// WGS84 GeoJSON point.
pub async fn point_convert(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(request): Json<PointRequest>,
) -> ApiResult<PointResponse> {
    let point = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { SpatialService::new(conn).point(&request.coordinates).await })
    })
    .await?;
    Ok(ApiResponse::success(point))
}

/// POST /spatial/regions - region names intersecting the features.
pub async fn regions_lookup(
    State(state): State<AppState>,
    Json(request): Json<RegionRequest>,
) -> ApiResult<RegionResponse> {
    let regions = state.regions.regions_for(&request.features).await?;
    Ok(ApiResponse::success(RegionResponse { regions }))
}
