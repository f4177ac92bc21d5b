// handlers/protected/draft.rs - wizard drafts for the calling user

use axum::extract::{Extension, Json, Multipart, Path, State};

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::attachment::UploadResponse;
use crate::database::models::draft::{
    DraftCreateRequest, DraftListItem, DraftResponse, DraftUpdateRequest, DraftView,
};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AttachmentService, DraftService};

use super::attachment::read_upload;

/// POST /draft - `{ is_project, name, data }` → `{ id, date }`
pub async fn draft_create(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(request): Json<DraftCreateRequest>,
) -> ApiResult<DraftResponse> {
    let draft = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { DraftService::new(conn).create(&request).await })
    })
    .await?;
    Ok(ApiResponse::success(draft))
}

/// PUT /draft - `{ id, name, data }` → `{ id, date }`
pub async fn draft_update(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(request): Json<DraftUpdateRequest>,
) -> ApiResult<DraftResponse> {
    let draft = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { DraftService::new(conn).update(&request).await })
    })
    .await?;
    Ok(ApiResponse::success(draft))
}

/// GET /drafts
pub async fn drafts_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<Vec<DraftListItem>> {
    let drafts = with_transaction(&state.pool, Some(&principal), |conn| {
        Box::pin(async move { DraftService::new(conn).list().await })
    })
    .await?;
    Ok(ApiResponse::success(drafts))
}

/// GET /draft/:draftId
pub async fn draft_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(draft_id): Path<i32>,
) -> ApiResult<DraftView> {
    let draft = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { DraftService::new(conn).get(draft_id).await })
    })
    .await?;
    Ok(ApiResponse::success(draft))
}

/// DELETE /draft/:draftId/delete
pub async fn draft_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(draft_id): Path<i32>,
) -> ApiResult<()> {
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { DraftService::new(conn).delete(draft_id).await })
    })
    .await?;
    Ok(ApiResponse::no_content())
}

/// POST /draft/:draftId/upload - multipart `media`; the stored key and a
/// signed URL are written into the draft under `thumbnail`.
pub async fn draft_upload(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(draft_id): Path<i32>,
    multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let (_, file) = read_upload(multipart).await?;
    let files = state.files.clone();
    let uploaded = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { AttachmentService::new(conn, &files).upload_to_draft(draft_id, &file).await })
    })
    .await?;
    Ok(ApiResponse::success(uploaded))
}
