use crate::auth::ProjectRole;
use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::ParticipantRecord;
use crate::database::sql::SqlStatement;

pub struct ParticipationRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> ParticipationRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// Names of the active roles a user holds on one project.
    pub fn project_roles_statement(system_user_id: i32, project_id: i32) -> SqlStatement {
        let mut stmt = SqlStatement::new(
            "SELECT pr.name FROM project_participation pp \
             JOIN project_role pr ON pr.project_role_id = pp.project_role_id \
             WHERE pr.record_end_date IS NULL AND pp.system_user_id = ",
        );
        stmt.push_bind(system_user_id).push_sql(" AND pp.project_id = ").push_bind(project_id);
        stmt
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<ParticipantRecord>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT pp.project_participation_id, pp.project_id, pp.system_user_id, su.user_identifier, \
             pp.project_role_id, pr.name AS project_role_name \
             FROM project_participation pp \
             JOIN project_role pr ON pr.project_role_id = pp.project_role_id \
             JOIN system_user su ON su.system_user_id = pp.system_user_id \
             WHERE pp.project_id = ",
        );
        stmt.push_bind(project_id).push_sql(" ORDER BY pp.project_participation_id");
        self.conn.fetch_all(&stmt).await.origin("ParticipationRepository->list")
    }

    pub async fn add(&mut self, project_id: i32, system_user_id: i32, role: ProjectRole) -> Result<i32, SqlError> {
        let mut stmt = SqlStatement::new(
            "INSERT INTO project_participation (project_id, system_user_id, project_role_id) \
             SELECT ",
        );
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(system_user_id)
            .push_sql(", project_role_id FROM project_role WHERE name = ")
            .push_bind(role.name())
            .push_sql(" ON CONFLICT (project_id, system_user_id) DO NOTHING RETURNING project_participation_id");
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to add project participant; the user may already be a participant")
            .await
            .origin("ParticipationRepository->add")?;
        Ok(id)
    }

    pub async fn update_role(&mut self, project_id: i32, participation_id: i32, role: ProjectRole) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new(
            "UPDATE project_participation SET project_role_id = (SELECT project_role_id FROM project_role WHERE name = ",
        );
        stmt.push_bind(role.name())
            .push_sql(") WHERE project_participation_id = ")
            .push_bind(participation_id)
            .push_sql(" AND project_id = ")
            .push_bind(project_id);
        self.conn.execute(&stmt).await.origin("ParticipationRepository->update_role")
    }

    pub async fn remove(&mut self, project_id: i32, participation_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM project_participation WHERE project_participation_id = ");
        stmt.push_bind(participation_id).push_sql(" AND project_id = ").push_bind(project_id);
        self.conn.execute(&stmt).await.origin("ParticipationRepository->remove")
    }

    pub async fn count_role(&mut self, project_id: i32, role: ProjectRole) -> Result<i64, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT count(*) FROM project_participation pp \
             JOIN project_role pr ON pr.project_role_id = pp.project_role_id WHERE pp.project_id = ",
        );
        stmt.push_bind(project_id).push_sql(" AND pr.name = ").push_bind(role.name());
        let (count,): (i64,) = self
            .conn
            .fetch_one(&stmt, "Failed to count project participants")
            .await
            .origin("ParticipationRepository->count_role")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_lookup_binds_both_ids() {
        let stmt = ParticipationRepository::project_roles_statement(4, 9);
        assert!(stmt.sql().ends_with("pp.system_user_id = $1 AND pp.project_id = $2"));
        assert_eq!(stmt.param_count(), 2);
    }
}
