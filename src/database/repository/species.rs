use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::sql::SqlStatement;

pub struct SpeciesRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> SpeciesRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub fn insert_statement(project_id: Option<i32>, species_id: Option<i32>) -> Option<SqlStatement> {
        let (project_id, species_id) = (project_id?, species_id?);
        let mut stmt = SqlStatement::new("INSERT INTO project_species (project_id, wldtaxonomic_units_id) VALUES (");
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(species_id)
            .push_sql(") RETURNING project_species_id");
        Some(stmt)
    }

    pub async fn insert(&mut self, project_id: i32, species_id: i32) -> Result<i32, SqlError> {
        let stmt = Self::insert_statement(Some(project_id), Some(species_id))
            .ok_or_else(|| SqlError::unexpected("Failed to build species insert", "SpeciesRepository->insert"))?;
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert project species")
            .await
            .origin("SpeciesRepository->insert")?;
        Ok(id)
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<i32>, SqlError> {
        let mut stmt = SqlStatement::new("SELECT wldtaxonomic_units_id FROM project_species WHERE project_id = ");
        stmt.push_bind(project_id).push_sql(" ORDER BY wldtaxonomic_units_id");
        let rows: Vec<(i32,)> = self.conn.fetch_all(&stmt).await.origin("SpeciesRepository->list")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Remove every species not in `keep`.
    pub fn delete_except_statement(project_id: i32, keep: &[i32]) -> SqlStatement {
        let mut stmt = SqlStatement::new("DELETE FROM project_species WHERE project_id = ");
        stmt.push_bind(project_id);
        if !keep.is_empty() {
            stmt.push_sql(" AND wldtaxonomic_units_id NOT IN (")
                .push_bind_list(keep.iter().copied())
                .push_sql(")");
        }
        stmt
    }

    pub async fn delete_except(&mut self, project_id: i32, keep: &[i32]) -> Result<u64, SqlError> {
        let stmt = Self::delete_except_statement(project_id, keep);
        self.conn.execute(&stmt).await.origin("SpeciesRepository->delete_except")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kept_species_are_bound_individually() {
        let stmt = SpeciesRepository::delete_except_statement(5, &[100, 200]);
        assert_eq!(
            stmt.sql(),
            "DELETE FROM project_species WHERE project_id = $1 AND wldtaxonomic_units_id NOT IN ($2, $3)"
        );

        let stmt = SpeciesRepository::delete_except_statement(5, &[]);
        assert_eq!(stmt.sql(), "DELETE FROM project_species WHERE project_id = $1");
    }
}
