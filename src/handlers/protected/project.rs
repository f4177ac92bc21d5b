// handlers/protected/project.rs - project and plan lifecycle

use axum::extract::{Extension, Json, Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::project::{ProjectCreateRequest, ProjectListItem, ProjectUpdateRequest, ProjectView};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ProjectService;

async fn create(state: &AppState, principal: &AuthPrincipal, request: ProjectCreateRequest, is_project: bool) -> ApiResult<Value> {
    let id = with_transaction(&state.pool, Some(principal), move |conn| {
        Box::pin(async move { ProjectService::new(conn).create(&request, is_project).await })
    })
    .await?;
    Ok(ApiResponse::created(json!({ "id": id })))
}

async fn list(state: &AppState, principal: &AuthPrincipal, is_project: bool) -> ApiResult<Vec<ProjectListItem>> {
    let caller = principal.clone();
    let projects = with_transaction(&state.pool, Some(principal), move |conn| {
        Box::pin(async move { ProjectService::new(conn).list(&caller, is_project).await })
    })
    .await?;
    Ok(ApiResponse::success(projects))
}

/// POST /project/create - details plus every section in one transaction.
/// Responds `201 { id }`.
pub async fn project_create(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(request): Json<ProjectCreateRequest>,
) -> ApiResult<Value> {
    create(&state, &principal, request, true).await
}

/// POST /plan/create
pub async fn plan_create(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(request): Json<ProjectCreateRequest>,
) -> ApiResult<Value> {
    create(&state, &principal, request, false).await
}

/// GET /projects
pub async fn projects_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<Vec<ProjectListItem>> {
    list(&state, &principal, true).await
}

/// GET /plans
pub async fn plans_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<Vec<ProjectListItem>> {
    list(&state, &principal, false).await
}

/// GET /project/:projectId/view
pub async fn project_view(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
) -> ApiResult<ProjectView> {
    let view = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { ProjectService::new(conn).view(project_id).await })
    })
    .await?;
    Ok(ApiResponse::success(view))
}

/// PUT /project/:projectId/update - sections present in the body replace
/// the stored ones; `project` needs the current `revision_count`.
pub async fn project_update(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
    Json(request): Json<ProjectUpdateRequest>,
) -> ApiResult<Value> {
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { ProjectService::new(conn).update(project_id, &request).await })
    })
    .await?;
    Ok(ApiResponse::success(json!({ "id": project_id })))
}

async fn set_published(state: &AppState, principal: &AuthPrincipal, project_id: i32, publish: bool) -> ApiResult<Value> {
    let state_now = with_transaction(&state.pool, Some(principal), move |conn| {
        Box::pin(async move { ProjectService::new(conn).set_published(project_id, publish).await })
    })
    .await?;
    Ok(ApiResponse::success(json!({ "id": project_id, "state": state_now })))
}

/// PUT /project/:projectId/publish
pub async fn project_publish(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
) -> ApiResult<Value> {
    set_published(&state, &principal, project_id, true).await
}

/// PUT /project/:projectId/unpublish
pub async fn project_unpublish(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
) -> ApiResult<Value> {
    set_published(&state, &principal, project_id, false).await
}

/// DELETE /project/:projectId/delete - archives the project.
pub async fn project_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
) -> ApiResult<()> {
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { ProjectService::new(conn).delete(project_id).await })
    })
    .await?;
    Ok(ApiResponse::no_content())
}
