// handlers/elevated/administrative_activity.rs - access request review

use axum::extract::{Extension, Json, Path, Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::administrative_activity::{ActivityFilter, AdministrativeActivityRecord, ApprovalRequest};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AdministrativeActivityService;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RejectRequest {
    pub notes: Option<String>,
}

/// GET /administrative-activities?type=&status=
pub async fn activities_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Query(filter): Query<ActivityFilter>,
) -> ApiResult<Vec<AdministrativeActivityRecord>> {
    let activities = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { AdministrativeActivityService::new(conn).list(&filter).await })
    })
    .await?;
    Ok(ApiResponse::success(activities))
}

/// PUT /administrative-activity/:activityId/approve - `{ roles, notes? }`.
/// The requester is emailed after commit.
pub async fn activity_approve(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(activity_id): Path<i32>,
    Json(approval): Json<ApprovalRequest>,
) -> ApiResult<()> {
    let requester = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { AdministrativeActivityService::new(conn).approve(activity_id, &approval).await })
    })
    .await?;

    if let Some(email) = &requester.email {
        state.notifier.access_approved(email, &requester.user_identifier).await;
    }
    Ok(ApiResponse::no_content())
}

/// PUT /administrative-activity/:activityId/reject
pub async fn activity_reject(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(activity_id): Path<i32>,
    body: Option<Json<RejectRequest>>,
) -> ApiResult<()> {
    let notes = body.and_then(|Json(b)| b.notes);
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move {
            AdministrativeActivityService::new(conn)
                .reject(activity_id, notes.as_deref())
                .await
        })
    })
    .await?;
    Ok(ApiResponse::no_content())
}
