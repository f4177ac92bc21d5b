// handlers/public/project.rs - published project listing and view

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::connection::with_transaction;
use crate::database::models::project::{ProjectListItem, ProjectView};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ProjectService;

/// GET /public/projects
pub async fn projects_list(State(state): State<AppState>) -> ApiResult<Vec<ProjectListItem>> {
    let projects = with_transaction(&state.pool, None, |conn| {
        Box::pin(async move { ProjectService::new(conn).list_published().await })
    })
    .await?;
    Ok(ApiResponse::success(projects))
}

/// GET /public/project/:projectId/view - published projects only; private
/// contacts are withheld.
pub async fn project_view(State(state): State<AppState>, Path(project_id): Path<i32>) -> ApiResult<ProjectView> {
    let view = with_transaction(&state.pool, None, move |conn| {
        Box::pin(async move { ProjectService::new(conn).view_published(project_id).await })
    })
    .await?;
    Ok(ApiResponse::success(view))
}
