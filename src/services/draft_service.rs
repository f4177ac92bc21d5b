use tracing::info;

use crate::database::connection::DbConnection;
use crate::database::models::draft::{DraftCreateRequest, DraftListItem, DraftResponse, DraftUpdateRequest, DraftView};
use crate::database::repository::draft::DraftRepository;
use crate::error::{ApiError, ApiResult};

use super::require_system_user_id;

/// Saved wizard forms, always scoped to the calling user.
pub struct DraftService<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> DraftService<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    fn owner(&self) -> ApiResult<i32> {
        require_system_user_id(self.conn.system_user_id())
    }

    pub async fn create(&mut self, request: &DraftCreateRequest) -> ApiResult<DraftResponse> {
        if request.name.trim().is_empty() {
            return Err(ApiError::invalid_field("name", "is required"));
        }
        let owner = self.owner()?;
        let row = DraftRepository::new(self.conn)
            .create(owner, request.is_project, &request.name, &request.data)
            .await?;
        info!(draft_id = row.webform_draft_id, "Created draft");
        Ok(row.into())
    }

    pub async fn update(&mut self, request: &DraftUpdateRequest) -> ApiResult<DraftResponse> {
        if request.name.trim().is_empty() {
            return Err(ApiError::invalid_field("name", "is required"));
        }
        let owner = self.owner()?;
        let row = DraftRepository::new(self.conn)
            .update(owner, request.id, &request.name, &request.data)
            .await?;
        Ok(row.into())
    }

    pub async fn get(&mut self, draft_id: i32) -> ApiResult<DraftView> {
        let owner = self.owner()?;
        DraftRepository::new(self.conn)
            .get(owner, draft_id)
            .await?
            .map(DraftView::from)
            .ok_or_else(|| ApiError::not_found(format!("Draft {} not found", draft_id)))
    }

    pub async fn list(&mut self) -> ApiResult<Vec<DraftListItem>> {
        let owner = self.owner()?;
        Ok(DraftRepository::new(self.conn).list(owner).await?)
    }

    pub async fn delete(&mut self, draft_id: i32) -> ApiResult<()> {
        let owner = self.owner()?;
        let deleted = DraftRepository::new(self.conn).delete(owner, draft_id).await?;
        if deleted == 0 {
            return Err(ApiError::not_found(format!("Draft {} not found", draft_id)));
        }
        Ok(())
    }
}
