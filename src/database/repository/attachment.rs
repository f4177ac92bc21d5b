use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::attachment::{AttachmentRecord, FileType};
use crate::database::sql::SqlStatement;

const ATTACHMENT_SELECT: &str = "SELECT project_attachment_id AS id, project_id, file_name, file_type, key, file_size, \
     COALESCE(update_date, create_date) AS last_modified FROM project_attachment";

pub struct AttachmentRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> AttachmentRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// Insert, or replace the row for the same project and file name.
    pub async fn upsert(
        &mut self,
        project_id: i32,
        file_name: &str,
        file_type: FileType,
        key: &str,
        file_size: i64,
    ) -> Result<i32, SqlError> {
        let mut stmt =
            SqlStatement::new("INSERT INTO project_attachment (project_id, file_name, file_type, key, file_size) VALUES (");
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(file_name)
            .push_sql(", ")
            .push_bind(file_type.as_str())
            .push_sql(", ")
            .push_bind(key)
            .push_sql(", ")
            .push_bind(file_size)
            .push_sql(
                ") ON CONFLICT (project_id, file_name) DO UPDATE SET file_type = EXCLUDED.file_type, \
                 key = EXCLUDED.key, file_size = EXCLUDED.file_size, update_date = now() \
                 RETURNING project_attachment_id",
            );
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to record project attachment")
            .await
            .origin("AttachmentRepository->upsert")?;
        Ok(id)
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<AttachmentRecord>, SqlError> {
        let mut stmt = SqlStatement::new(ATTACHMENT_SELECT);
        stmt.push_sql(" WHERE project_id = ").push_bind(project_id).push_sql(" ORDER BY file_name");
        self.conn.fetch_all(&stmt).await.origin("AttachmentRepository->list")
    }

    pub async fn get(&mut self, project_id: i32, attachment_id: i32) -> Result<Option<AttachmentRecord>, SqlError> {
        let mut stmt = SqlStatement::new(ATTACHMENT_SELECT);
        stmt.push_sql(" WHERE project_id = ")
            .push_bind(project_id)
            .push_sql(" AND project_attachment_id = ")
            .push_bind(attachment_id);
        self.conn.fetch_optional(&stmt).await.origin("AttachmentRepository->get")
    }

    pub async fn delete(&mut self, project_id: i32, attachment_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM project_attachment WHERE project_id = ");
        stmt.push_bind(project_id)
            .push_sql(" AND project_attachment_id = ")
            .push_bind(attachment_id);
        self.conn.execute(&stmt).await.origin("AttachmentRepository->delete")
    }
}
