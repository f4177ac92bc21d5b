use serde_json::Value;

use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::draft::{DraftListItem, DraftRecord, DraftTimestamps};
use crate::database::sql::SqlStatement;

pub struct DraftRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> DraftRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub fn insert_statement(system_user_id: Option<i32>, is_project: bool, name: &str, data: &Value) -> Option<SqlStatement> {
        let system_user_id = system_user_id?;
        let mut stmt = SqlStatement::new("INSERT INTO webform_draft (system_user_id, is_project, name, data) VALUES (");
        stmt.push_bind(system_user_id)
            .push_sql(", ")
            .push_bind(is_project)
            .push_sql(", ")
            .push_bind(name)
            .push_sql(", ")
            .push_bind(data.clone())
            .push_sql(") RETURNING webform_draft_id, create_date, update_date");
        Some(stmt)
    }

    pub async fn create(
        &mut self,
        system_user_id: i32,
        is_project: bool,
        name: &str,
        data: &Value,
    ) -> Result<DraftTimestamps, SqlError> {
        let stmt = Self::insert_statement(Some(system_user_id), is_project, name, data)
            .ok_or_else(|| SqlError::unexpected("Failed to build draft insert", "DraftRepository->create"))?;
        self.conn
            .fetch_one(&stmt, "Failed to create draft")
            .await
            .origin("DraftRepository->create")
    }

    pub async fn update(
        &mut self,
        system_user_id: i32,
        draft_id: i32,
        name: &str,
        data: &Value,
    ) -> Result<DraftTimestamps, SqlError> {
        let mut stmt = SqlStatement::new("UPDATE webform_draft SET name = ");
        stmt.push_bind(name)
            .push_sql(", data = ")
            .push_bind(data.clone())
            .push_sql(", update_date = now() WHERE webform_draft_id = ")
            .push_bind(draft_id)
            .push_sql(" AND system_user_id = ")
            .push_bind(system_user_id)
            .push_sql(" RETURNING webform_draft_id, create_date, update_date");
        self.conn
            .fetch_one(&stmt, "Failed to update draft")
            .await
            .origin("DraftRepository->update")
    }

    pub async fn get(&mut self, system_user_id: i32, draft_id: i32) -> Result<Option<DraftRecord>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT webform_draft_id, system_user_id, is_project, name, data, create_date, update_date \
             FROM webform_draft WHERE webform_draft_id = ",
        );
        stmt.push_bind(draft_id).push_sql(" AND system_user_id = ").push_bind(system_user_id);
        self.conn.fetch_optional(&stmt).await.origin("DraftRepository->get")
    }

    pub async fn list(&mut self, system_user_id: i32) -> Result<Vec<DraftListItem>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT webform_draft_id AS id, is_project, name, COALESCE(update_date, create_date) AS date \
             FROM webform_draft WHERE system_user_id = ",
        );
        stmt.push_bind(system_user_id).push_sql(" ORDER BY date DESC");
        self.conn.fetch_all(&stmt).await.origin("DraftRepository->list")
    }

    pub async fn delete(&mut self, system_user_id: i32, draft_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM webform_draft WHERE webform_draft_id = ");
        stmt.push_bind(draft_id).push_sql(" AND system_user_id = ").push_bind(system_user_id);
        self.conn.execute(&stmt).await.origin("DraftRepository->delete")
    }

    /// Store `value` under the `thumbnail` key of the draft's data.
    pub async fn set_thumbnail(&mut self, system_user_id: i32, draft_id: i32, value: Value) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("UPDATE webform_draft SET data = jsonb_set(data, '{thumbnail}', ");
        stmt.push_bind(value)
            .push_sql(", true), update_date = now() WHERE webform_draft_id = ")
            .push_bind(draft_id)
            .push_sql(" AND system_user_id = ")
            .push_bind(system_user_id);
        self.conn.execute(&stmt).await.origin("DraftRepository->set_thumbnail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_requires_an_owner() {
        assert!(DraftRepository::insert_statement(None, true, "d", &json!({})).is_none());
        let stmt = DraftRepository::insert_statement(Some(2), false, "d", &json!({"a": 1})).unwrap();
        assert_eq!(stmt.param_count(), 4);
    }
}
