use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::database::connection::DbConnection;
use crate::database::models::attachment::{AttachmentRecord, FileType, UploadResponse};
use crate::database::repository::{attachment::AttachmentRepository, draft::DraftRepository, project::ProjectRepository};
use crate::error::{ApiError, ApiResult};
use crate::storage::{draft_key, project_key, FileStorage};

use super::require_system_user_id;

/// One file pulled out of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedUrl {
    pub url: String,
}

pub struct AttachmentService<'c> {
    conn: &'c mut DbConnection,
    files: &'c FileStorage,
}

impl<'c> AttachmentService<'c> {
    pub fn new(conn: &'c mut DbConnection, files: &'c FileStorage) -> Self {
        Self { conn, files }
    }

    fn check_size(&self, file: &UploadedFile) -> ApiResult<()> {
        if file.body.len() > self.files.max_upload_bytes {
            return Err(ApiError::payload_too_large(format!(
                "File exceeds the {} byte upload limit",
                self.files.max_upload_bytes
            )));
        }
        Ok(())
    }

    pub async fn upload_to_project(
        &mut self,
        project_id: i32,
        file_type: FileType,
        file: &UploadedFile,
    ) -> ApiResult<UploadResponse> {
        if file_type == FileType::Draft {
            return Err(ApiError::invalid_field("fileType", "must be 'attachments' or 'thumbnail'"));
        }
        self.check_size(file)?;
        if ProjectRepository::new(self.conn).get(project_id).await?.is_none() {
            return Err(ApiError::not_found(format!("Project {} not found", project_id)));
        }

        let key = project_key(project_id, &file.file_name)?;
        self.files
            .scan_and_put(&key, &file.body, file.content_type.as_deref())
            .await?;

        let size = i64::try_from(file.body.len()).unwrap_or(i64::MAX);
        let id = AttachmentRepository::new(self.conn)
            .upsert(project_id, file.file_name.trim(), file_type, &key, size)
            .await?;

        info!(project_id, attachment_id = id, %key, "Stored project attachment");
        Ok(UploadResponse {
            id: Some(id),
            url: self.files.signer.sign(&key),
            key,
        })
    }

    /// Store a draft image and record it under the draft's `thumbnail`.
    pub async fn upload_to_draft(&mut self, draft_id: i32, file: &UploadedFile) -> ApiResult<UploadResponse> {
        self.check_size(file)?;
        let owner = require_system_user_id(self.conn.system_user_id())?;
        if DraftRepository::new(self.conn).get(owner, draft_id).await?.is_none() {
            return Err(ApiError::not_found(format!("Draft {} not found", draft_id)));
        }

        let key = draft_key(draft_id, &file.file_name)?;
        self.files
            .scan_and_put(&key, &file.body, file.content_type.as_deref())
            .await?;

        let url = self.files.signer.sign(&key);
        DraftRepository::new(self.conn)
            .set_thumbnail(owner, draft_id, json!({ "key": key, "url": url }))
            .await?;

        Ok(UploadResponse { id: None, key, url })
    }

    pub async fn list(&mut self, project_id: i32) -> ApiResult<Vec<AttachmentRecord>> {
        Ok(AttachmentRepository::new(self.conn).list(project_id).await?)
    }

    pub async fn signed_url(&mut self, project_id: i32, attachment_id: i32) -> ApiResult<SignedUrl> {
        let attachment = self.get(project_id, attachment_id).await?;
        Ok(SignedUrl {
            url: self.files.signer.sign(&attachment.key),
        })
    }

    /// Removes the row, then the stored object.
    pub async fn delete(&mut self, project_id: i32, attachment_id: i32) -> ApiResult<()> {
        let attachment = self.get(project_id, attachment_id).await?;
        AttachmentRepository::new(self.conn)
            .delete(project_id, attachment_id)
            .await?;
        self.files.store.delete(&attachment.key).await?;
        info!(project_id, attachment_id, key = %attachment.key, "Deleted project attachment");
        Ok(())
    }

    async fn get(&mut self, project_id: i32, attachment_id: i32) -> ApiResult<AttachmentRecord> {
        AttachmentRepository::new(self.conn)
            .get(project_id, attachment_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Attachment {} not found", attachment_id)))
    }
}
