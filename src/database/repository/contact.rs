use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::{ContactPayload, ContactRecord};
use crate::database::sql::SqlStatement;

pub struct ContactRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> ContactRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub fn insert_statement(project_id: Option<i32>, contact: Option<&ContactPayload>) -> Option<SqlStatement> {
        let (project_id, contact) = (project_id?, contact?);
        let mut stmt = SqlStatement::new(
            "INSERT INTO project_contact (project_id, first_name, last_name, email_address, agency, is_public, is_primary) VALUES (",
        );
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(&contact.first_name)
            .push_sql(", ")
            .push_bind(&contact.last_name)
            .push_sql(", ")
            .push_bind(&contact.email_address)
            .push_sql(", ")
            .push_bind(&contact.agency)
            .push_sql(", ")
            .push_bind(contact.is_public)
            .push_sql(", ")
            .push_bind(contact.is_primary)
            .push_sql(") RETURNING project_contact_id");
        Some(stmt)
    }

    pub async fn insert(&mut self, project_id: i32, contact: &ContactPayload) -> Result<i32, SqlError> {
        let stmt = Self::insert_statement(Some(project_id), Some(contact))
            .ok_or_else(|| SqlError::unexpected("Failed to build contact insert", "ContactRepository->insert"))?;
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert project contact")
            .await
            .origin("ContactRepository->insert")?;
        Ok(id)
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<ContactRecord>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT project_contact_id, first_name, last_name, email_address, agency, is_public, is_primary \
             FROM project_contact WHERE project_id = ",
        );
        stmt.push_bind(project_id).push_sql(" ORDER BY is_primary DESC, project_contact_id");
        self.conn.fetch_all(&stmt).await.origin("ContactRepository->list")
    }

    pub async fn delete_all(&mut self, project_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM project_contact WHERE project_id = ");
        stmt.push_bind(project_id);
        self.conn.execute(&stmt).await.origin("ContactRepository->delete_all")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_needs_project_and_payload() {
        let contact = ContactPayload {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email_address: "jane@example.com".into(),
            agency: "Ministry".into(),
            is_public: true,
            is_primary: true,
        };
        assert!(ContactRepository::insert_statement(None, Some(&contact)).is_none());
        assert!(ContactRepository::insert_statement(Some(1), None).is_none());
        let stmt = ContactRepository::insert_statement(Some(1), Some(&contact)).unwrap();
        assert_eq!(stmt.param_count(), 7);
    }
}
