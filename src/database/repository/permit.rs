use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::{PermitPayload, PermitRecord};
use crate::database::sql::SqlStatement;

pub struct PermitRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> PermitRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub fn insert_statement(project_id: Option<i32>, permit: Option<&PermitPayload>) -> Option<SqlStatement> {
        let (project_id, permit) = (project_id?, permit?);
        let mut stmt = SqlStatement::new("INSERT INTO permit (project_id, number, type) VALUES (");
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(&permit.permit_number)
            .push_sql(", ")
            .push_bind(&permit.permit_type)
            .push_sql(") RETURNING permit_id");
        Some(stmt)
    }

    pub async fn insert(&mut self, project_id: i32, permit: &PermitPayload) -> Result<i32, SqlError> {
        let stmt = Self::insert_statement(Some(project_id), Some(permit))
            .ok_or_else(|| SqlError::unexpected("Failed to build permit insert", "PermitRepository->insert"))?;
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert project permit")
            .await
            .origin("PermitRepository->insert")?;
        Ok(id)
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<PermitRecord>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT permit_id, number AS permit_number, type AS permit_type FROM permit WHERE project_id = ",
        );
        stmt.push_bind(project_id).push_sql(" ORDER BY permit_id");
        self.conn.fetch_all(&stmt).await.origin("PermitRepository->list")
    }

    pub async fn delete_all(&mut self, project_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM permit WHERE project_id = ");
        stmt.push_bind(project_id);
        self.conn.execute(&stmt).await.origin("PermitRepository->delete_all")
    }
}
