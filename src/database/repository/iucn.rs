use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::IucnRecord;
use crate::database::sql::SqlStatement;

pub struct IucnRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> IucnRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// `subclassification_id` is the level 3 subclassification.
    pub fn insert_statement(project_id: Option<i32>, subclassification_id: Option<i32>) -> Option<SqlStatement> {
        let (project_id, subclassification_id) = (project_id?, subclassification_id?);
        let mut stmt = SqlStatement::new(
            "INSERT INTO project_iucn_action_classification \
             (project_id, iucn_conservation_action_level_3_subclassification_id) VALUES (",
        );
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(subclassification_id)
            .push_sql(") RETURNING project_iucn_action_classification_id");
        Some(stmt)
    }

    pub async fn insert(&mut self, project_id: i32, subclassification_id: i32) -> Result<i32, SqlError> {
        let stmt = Self::insert_statement(Some(project_id), Some(subclassification_id))
            .ok_or_else(|| SqlError::unexpected("Failed to build IUCN insert", "IucnRepository->insert"))?;
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert project IUCN classification")
            .await
            .origin("IucnRepository->insert")?;
        Ok(id)
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<IucnRecord>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT pic.project_iucn_action_classification_id, \
             l2.iucn_conservation_action_level_1_classification_id AS classification, \
             l3.iucn_conservation_action_level_2_subclassification_id AS subclassification1, \
             l3.iucn_conservation_action_level_3_subclassification_id AS subclassification2 \
             FROM project_iucn_action_classification pic \
             JOIN iucn_conservation_action_level_3_subclassification l3 \
               ON l3.iucn_conservation_action_level_3_subclassification_id = pic.iucn_conservation_action_level_3_subclassification_id \
             JOIN iucn_conservation_action_level_2_subclassification l2 \
               ON l2.iucn_conservation_action_level_2_subclassification_id = l3.iucn_conservation_action_level_2_subclassification_id \
             WHERE pic.project_id = ",
        );
        stmt.push_bind(project_id);
        self.conn.fetch_all(&stmt).await.origin("IucnRepository->list")
    }

    pub async fn delete_all(&mut self, project_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM project_iucn_action_classification WHERE project_id = ");
        stmt.push_bind(project_id);
        self.conn.execute(&stmt).await.origin("IucnRepository->delete_all")
    }
}
