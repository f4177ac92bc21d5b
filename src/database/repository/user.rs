use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::user::{SystemUserRecord, UserStanding};
use crate::database::sql::SqlStatement;

const USER_SELECT: &str = "SELECT su.system_user_id, su.user_identifier, uis.name AS identity_source, su.email, \
     su.display_name, su.record_end_date, \
     COALESCE(array_remove(array_agg(sr.name::text ORDER BY sr.name), NULL), '{}'::text[]) AS role_names \
     FROM system_user su \
     JOIN user_identity_source uis ON uis.user_identity_source_id = su.user_identity_source_id \
     LEFT JOIN system_user_role sur ON sur.system_user_id = su.system_user_id \
     LEFT JOIN system_role sr ON sr.system_role_id = sur.system_role_id AND sr.record_end_date IS NULL ";

const USER_GROUP: &str = " GROUP BY su.system_user_id, uis.name";

pub struct UserRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub fn find_by_identifier_statement(user_identifier: &str, identity_source: &str) -> SqlStatement {
        let mut stmt = SqlStatement::new(USER_SELECT);
        stmt.push_sql("WHERE lower(su.user_identifier) = lower(")
            .push_bind(user_identifier)
            .push_sql(") AND uis.name = upper(")
            .push_bind(identity_source)
            .push_sql(")")
            .push_sql(USER_GROUP);
        stmt
    }

    pub fn standing_statement(system_user_id: i32) -> SqlStatement {
        let mut stmt = SqlStatement::new(
            "SELECT EXISTS (SELECT 1 FROM administrative_activity aa \
               JOIN administrative_activity_status_type s \
                 ON s.administrative_activity_status_type_id = aa.administrative_activity_status_type_id \
               WHERE s.name = 'Pending' AND aa.reported_system_user_id = ",
        );
        stmt.push_bind(system_user_id)
            .push_sql(") AS has_pending_access_request, EXISTS (SELECT 1 FROM project_participation pp WHERE pp.system_user_id = ")
            .push_bind(system_user_id)
            .push_sql(") AS has_one_or_more_project_roles");
        stmt
    }

    pub async fn find_by_identifier(
        &mut self,
        user_identifier: &str,
        identity_source: &str,
    ) -> Result<Option<SystemUserRecord>, SqlError> {
        let stmt = Self::find_by_identifier_statement(user_identifier, identity_source);
        self.conn.fetch_optional(&stmt).await.origin("UserRepository->find_by_identifier")
    }

    pub async fn get(&mut self, system_user_id: i32) -> Result<Option<SystemUserRecord>, SqlError> {
        let mut stmt = SqlStatement::new(USER_SELECT);
        stmt.push_sql("WHERE su.system_user_id = ").push_bind(system_user_id).push_sql(USER_GROUP);
        self.conn.fetch_optional(&stmt).await.origin("UserRepository->get")
    }

    pub async fn list(&mut self) -> Result<Vec<SystemUserRecord>, SqlError> {
        let mut stmt = SqlStatement::new(USER_SELECT);
        stmt.push_sql("WHERE su.record_end_date IS NULL")
            .push_sql(USER_GROUP)
            .push_sql(" ORDER BY su.user_identifier");
        self.conn.fetch_all(&stmt).await.origin("UserRepository->list")
    }

    pub async fn standing(&mut self, system_user_id: i32) -> Result<UserStanding, SqlError> {
        let stmt = Self::standing_statement(system_user_id);
        self.conn
            .fetch_one(&stmt, "Failed to get user standing")
            .await
            .origin("UserRepository->standing")
    }

    /// Insert a user, or reactivate and return an existing one.
    pub async fn add(
        &mut self,
        user_identifier: &str,
        identity_source: &str,
        email: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<i32, SqlError> {
        let mut stmt = SqlStatement::new(
            "INSERT INTO system_user (user_identity_source_id, user_identifier, email, display_name) \
             SELECT user_identity_source_id, ",
        );
        stmt.push_bind(user_identifier.to_lowercase())
            .push_sql(", ")
            .push_bind(email)
            .push_sql(", ")
            .push_bind(display_name)
            .push_sql(" FROM user_identity_source WHERE name = upper(")
            .push_bind(identity_source)
            .push_sql(
                ") AND record_end_date IS NULL \
                 ON CONFLICT (user_identifier, user_identity_source_id) \
                 DO UPDATE SET record_end_date = NULL, email = COALESCE(EXCLUDED.email, system_user.email) \
                 RETURNING system_user_id",
            );
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert system user")
            .await
            .origin("UserRepository->add")?;
        Ok(id)
    }

    pub async fn end_date(&mut self, system_user_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("UPDATE system_user SET record_end_date = now() WHERE system_user_id = ");
        stmt.push_bind(system_user_id).push_sql(" AND record_end_date IS NULL");
        self.conn.execute(&stmt).await.origin("UserRepository->end_date")
    }

    pub fn add_roles_statement(system_user_id: i32, roles: &[String]) -> SqlStatement {
        let mut stmt = SqlStatement::new("INSERT INTO system_user_role (system_user_id, system_role_id) SELECT ");
        stmt.push_bind(system_user_id)
            .push_sql(", system_role_id FROM system_role WHERE record_end_date IS NULL AND name IN (")
            .push_bind_list(roles.iter().cloned())
            .push_sql(") ON CONFLICT (system_user_id, system_role_id) DO NOTHING");
        stmt
    }

    pub async fn add_roles(&mut self, system_user_id: i32, roles: &[String]) -> Result<u64, SqlError> {
        if roles.is_empty() {
            return Ok(0);
        }
        let stmt = Self::add_roles_statement(system_user_id, roles);
        self.conn.execute(&stmt).await.origin("UserRepository->add_roles")
    }

    pub async fn remove_role(&mut self, system_user_id: i32, system_role_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM system_user_role WHERE system_user_id = ");
        stmt.push_bind(system_user_id).push_sql(" AND system_role_id = ").push_bind(system_role_id);
        self.conn.execute(&stmt).await.origin("UserRepository->remove_role")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_are_bound_not_inlined() {
        let roles = vec!["Maintainer".to_string(), "Project Creator".to_string()];
        let stmt = UserRepository::add_roles_statement(3, &roles);
        assert!(stmt.sql().contains("name IN ($2, $3)"));
        assert!(!stmt.sql().contains("Maintainer"));
    }

    #[test]
    fn lookup_is_grouped_per_user() {
        let stmt = UserRepository::find_by_identifier_statement("jdoe", "idir");
        assert!(stmt.sql().ends_with("GROUP BY su.system_user_id, uis.name"));
        assert_eq!(stmt.param_count(), 2);
    }
}
