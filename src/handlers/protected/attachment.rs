// handlers/protected/attachment.rs - project attachment upload, listing,
// signed URLs and deletion

use axum::extract::{Extension, Multipart, Path, State};

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::attachment::{AttachmentRecord, FileType, UploadResponse};
use crate::error::{ApiError, ApiResult as Result};
use crate::handlers::multipart_error;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::attachment_service::{SignedUrl, UploadedFile};
use crate::services::AttachmentService;

/// Pull the `media` file and the optional `fileType` field out of a
/// multipart body.
pub(crate) async fn read_upload(mut multipart: Multipart) -> Result<(Option<FileType>, UploadedFile)> {
    let mut file_type = None;
    let mut media = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("media") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::invalid_field("media", "must be a file"))?;
                let content_type = field.content_type().map(str::to_string);
                let body = field.bytes().await.map_err(multipart_error)?;
                media = Some(UploadedFile {
                    file_name,
                    content_type,
                    body: body.to_vec(),
                });
            }
            Some("fileType") => {
                let value = field.text().await.map_err(multipart_error)?;
                file_type = Some(FileType::parse(&value).ok_or_else(|| {
                    ApiError::invalid_field("fileType", format!("unknown file type '{}'", value))
                })?);
            }
            _ => {}
        }
    }

    let media = media.ok_or_else(|| ApiError::invalid_field("media", "is required"))?;
    Ok((file_type, media))
}

/// POST /project/:projectId/attachments/upload - multipart `media` plus
/// `fileType` (`attachments` by default, or `thumbnail`).
pub async fn attachment_upload(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
    multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let (file_type, file) = read_upload(multipart).await?;
    let file_type = file_type.unwrap_or(FileType::Attachments);
    let files = state.files.clone();
    let uploaded = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move {
            AttachmentService::new(conn, &files)
                .upload_to_project(project_id, file_type, &file)
                .await
        })
    })
    .await?;
    Ok(ApiResponse::success(uploaded))
}

/// GET /project/:projectId/attachments/list
pub async fn attachments_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(project_id): Path<i32>,
) -> ApiResult<Vec<AttachmentRecord>> {
    let files = state.files.clone();
    let attachments = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { AttachmentService::new(conn, &files).list(project_id).await })
    })
    .await?;
    Ok(ApiResponse::success(attachments))
}

/// GET /project/:projectId/attachments/:attachmentId/getSignedUrl
pub async fn attachment_signed_url(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path((project_id, attachment_id)): Path<(i32, i32)>,
) -> ApiResult<SignedUrl> {
    let files = state.files.clone();
    let url = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move {
            AttachmentService::new(conn, &files)
                .signed_url(project_id, attachment_id)
                .await
        })
    })
    .await?;
    Ok(ApiResponse::success(url))
}

/// DELETE /project/:projectId/attachments/:attachmentId/delete
pub async fn attachment_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path((project_id, attachment_id)): Path<(i32, i32)>,
) -> ApiResult<()> {
    let files = state.files.clone();
    with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move {
            AttachmentService::new(conn, &files)
                .delete(project_id, attachment_id)
                .await
        })
    })
    .await?;
    Ok(ApiResponse::no_content())
}
