use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::sql::SqlStatement;

pub struct PartnershipRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> PartnershipRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// Blank names build nothing.
    pub fn insert_statement(project_id: Option<i32>, name: Option<&str>) -> Option<SqlStatement> {
        let project_id = project_id?;
        let name = name.map(str::trim).filter(|n| !n.is_empty())?;
        let mut stmt = SqlStatement::new("INSERT INTO project_partnership (project_id, name) VALUES (");
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(name)
            .push_sql(") RETURNING project_partnership_id");
        Some(stmt)
    }

    pub async fn insert(&mut self, project_id: i32, name: &str) -> Result<Option<i32>, SqlError> {
        let Some(stmt) = Self::insert_statement(Some(project_id), Some(name)) else {
            return Ok(None);
        };
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert project partnership")
            .await
            .origin("PartnershipRepository->insert")?;
        Ok(Some(id))
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<String>, SqlError> {
        let mut stmt = SqlStatement::new("SELECT name FROM project_partnership WHERE project_id = ");
        stmt.push_bind(project_id).push_sql(" ORDER BY project_partnership_id");
        let rows: Vec<(String,)> = self.conn.fetch_all(&stmt).await.origin("PartnershipRepository->list")?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    pub async fn delete_all(&mut self, project_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM project_partnership WHERE project_id = ");
        stmt.push_bind(project_id);
        self.conn.execute(&stmt).await.origin("PartnershipRepository->delete_all")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_partnerships_are_skipped() {
        assert!(PartnershipRepository::insert_statement(Some(1), Some("   ")).is_none());
        assert!(PartnershipRepository::insert_statement(Some(1), None).is_none());
        assert!(PartnershipRepository::insert_statement(Some(1), Some("Nation")).is_some());
    }
}
