// handlers/protected/participant.rs - project team membership

use axum::extract::{Extension, Json, Path, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::project::{ParticipantPayload, ParticipantRecord};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ProjectService;

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub project_role: String,
}

/// GET /project/:projectId/participants
pub async fn participants_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
) -> ApiResult<Vec<ParticipantRecord>> {
    let participants = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { ProjectService::new(conn).participants(project_id).await })
    })
    .await?;
    Ok(ApiResponse::success(participants))
}

/// POST /project/:projectId/participants - `{ system_user_id, project_role }`
pub async fn participant_add(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
    Json(payload): Json<ParticipantPayload>,
) -> ApiResult<Value> {
    let id = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { ProjectService::new(conn).add_participant(project_id, &payload).await })
    })
    .await?;
    Ok(ApiResponse::created(json!({ "id": id })))
}

/// PUT /project/:projectId/participants/:participationId/role
pub async fn participant_role_update(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path((project_id, participation_id)): Path<(i32, i32)>,
    Json(change): Json<RoleChange>,
) -> ApiResult<()> {
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move {
            ProjectService::new(conn)
                .change_participant_role(project_id, participation_id, &change.project_role)
                .await
        })
    })
    .await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /project/:projectId/participants/:participationId
pub async fn participant_remove(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path((project_id, participation_id)): Path<(i32, i32)>,
) -> ApiResult<()> {
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move {
            ProjectService::new(conn)
                .remove_participant(project_id, participation_id)
                .await
        })
    })
    .await?;
    Ok(ApiResponse::no_content())
}
