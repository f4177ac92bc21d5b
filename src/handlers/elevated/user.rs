// handlers/elevated/user.rs - system user management

use axum::extract::{Extension, Json, Path, State};

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::user::{RoleAssignment, SystemUserRecord, UserCreateRequest};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;

/// GET /users - active users with their system roles.
pub async fn users_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<Vec<SystemUserRecord>> {
    let users = with_transaction(&state.pool, Some(&principal), |conn| {
        Box::pin(async move { UserService::new(conn).list().await })
    })
    .await?;
    Ok(ApiResponse::success(users))
}

/// GET /user/:userId
pub async fn user_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(user_id): Path<i32>,
) -> ApiResult<SystemUserRecord> {
    let user = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { UserService::new(conn).get(user_id).await })
    })
    .await?;
    Ok(ApiResponse::success(user))
}

/// POST /user/add - `{ user_identifier, identity_source, email?, roles }`
pub async fn user_add(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(request): Json<UserCreateRequest>,
) -> ApiResult<SystemUserRecord> {
    let user = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { UserService::new(conn).add(&request).await })
    })
    .await?;
    Ok(ApiResponse::created(user))
}

/// DELETE /user/:userId/delete - end-dates the user.
pub async fn user_remove(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(user_id): Path<i32>,
) -> ApiResult<()> {
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { UserService::new(conn).end_date(user_id).await })
    })
    .await?;
    Ok(ApiResponse::no_content())
}

/// POST /user/:userId/system-roles - `{ roles }`
pub async fn user_roles_add(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(user_id): Path<i32>,
    Json(assignment): Json<RoleAssignment>,
) -> ApiResult<SystemUserRecord> {
    let user = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { UserService::new(conn).add_roles(user_id, &assignment.roles).await })
    })
    .await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /user/:userId/system-roles/:roleId
pub async fn user_role_remove(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path((user_id, role_id)): Path<(i32, i32)>,
) -> ApiResult<()> {
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { UserService::new(conn).remove_role(user_id, role_id).await })
    })
    .await?;
    Ok(ApiResponse::no_content())
}
