use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::{FundingPayload, FundingRecord};
use crate::database::sql::SqlStatement;

pub struct FundingRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> FundingRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub fn insert_statement(project_id: Option<i32>, funding: Option<&FundingPayload>) -> Option<SqlStatement> {
        let (project_id, funding) = (project_id?, funding?);
        let mut stmt = SqlStatement::new(
            "INSERT INTO project_funding_source (project_id, funding_source_id, funding_project_id, funding_amount, \
             start_date, end_date, description) VALUES (",
        );
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(funding.funding_source_id)
            .push_sql(", ")
            .push_bind(funding.funding_project_id.clone())
            .push_sql(", ")
            .push_bind(funding.funding_amount)
            .push_sql(", ")
            .push_bind(funding.start_date)
            .push_sql(", ")
            .push_bind(funding.end_date)
            .push_sql(", ")
            .push_bind(funding.description.clone())
            .push_sql(") RETURNING project_funding_source_id");
        Some(stmt)
    }

    pub async fn insert(&mut self, project_id: i32, funding: &FundingPayload) -> Result<i32, SqlError> {
        let stmt = Self::insert_statement(Some(project_id), Some(funding))
            .ok_or_else(|| SqlError::unexpected("Failed to build funding insert", "FundingRepository->insert"))?;
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert project funding source")
            .await
            .origin("FundingRepository->insert")?;
        Ok(id)
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<FundingRecord>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT pfs.project_funding_source_id, pfs.funding_source_id, fs.name AS funding_source_name, \
             pfs.funding_project_id, pfs.funding_amount, pfs.start_date, pfs.end_date, pfs.description \
             FROM project_funding_source pfs \
             JOIN funding_source fs ON fs.funding_source_id = pfs.funding_source_id \
             WHERE pfs.project_id = ",
        );
        stmt.push_bind(project_id).push_sql(" ORDER BY pfs.start_date");
        self.conn.fetch_all(&stmt).await.origin("FundingRepository->list")
    }

    pub async fn delete_all(&mut self, project_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM project_funding_source WHERE project_id = ");
        stmt.push_bind(project_id);
        self.conn.execute(&stmt).await.origin("FundingRepository->delete_all")
    }
}
