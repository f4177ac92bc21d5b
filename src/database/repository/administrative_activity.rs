use serde_json::Value;

use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::administrative_activity::{
    ActivityCreated, ActivityFilter, ActivityStatus, AdministrativeActivityRecord, SYSTEM_ACCESS,
};
use crate::database::sql::SqlStatement;

const ACTIVITY_SELECT: &str = "SELECT aa.administrative_activity_id AS id, aat.name AS type_name, \
     aast.name AS status_name, aa.reported_system_user_id, aa.description, aa.data, aa.notes, aa.create_date \
     FROM administrative_activity aa \
     JOIN administrative_activity_type aat \
       ON aat.administrative_activity_type_id = aa.administrative_activity_type_id \
     JOIN administrative_activity_status_type aast \
       ON aast.administrative_activity_status_type_id = aa.administrative_activity_status_type_id";

pub struct AdministrativeActivityRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> AdministrativeActivityRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub fn insert_statement(reporter_id: Option<i32>, data: &Value) -> Option<SqlStatement> {
        let reporter_id = reporter_id?;
        let mut stmt = SqlStatement::new(
            "INSERT INTO administrative_activity (reported_system_user_id, administrative_activity_type_id, \
             administrative_activity_status_type_id, description, data) VALUES (",
        );
        stmt.push_bind(reporter_id)
            .push_sql(", (SELECT administrative_activity_type_id FROM administrative_activity_type WHERE name = ")
            .push_bind(SYSTEM_ACCESS)
            .push_sql("), (SELECT administrative_activity_status_type_id FROM administrative_activity_status_type WHERE name = ")
            .push_bind(ActivityStatus::Pending.name())
            .push_sql("), ")
            .push_bind(SYSTEM_ACCESS)
            .push_sql(", ")
            .push_bind(data.clone())
            .push_sql(") RETURNING administrative_activity_id AS id, create_date");
        Some(stmt)
    }

    pub async fn create_access_request(&mut self, reporter_id: i32, data: &Value) -> Result<ActivityCreated, SqlError> {
        let stmt = Self::insert_statement(Some(reporter_id), data).ok_or_else(|| {
            SqlError::unexpected(
                "Failed to build administrative activity insert",
                "AdministrativeActivityRepository->create_access_request",
            )
        })?;
        self.conn
            .fetch_one(&stmt, "Failed to submit administrative activity")
            .await
            .origin("AdministrativeActivityRepository->create_access_request")
    }

    pub fn list_statement(filter: &ActivityFilter) -> SqlStatement {
        let mut stmt = SqlStatement::new(ACTIVITY_SELECT);
        stmt.push_sql(" WHERE 1 = 1");
        if let Some(type_name) = &filter.type_name {
            stmt.push_sql(" AND aat.name = ").push_bind(type_name);
        }
        if let Some(status) = &filter.status {
            stmt.push_sql(" AND aast.name = ").push_bind(status);
        }
        stmt.push_sql(" ORDER BY aa.create_date DESC");
        stmt
    }

    pub async fn list(&mut self, filter: &ActivityFilter) -> Result<Vec<AdministrativeActivityRecord>, SqlError> {
        let stmt = Self::list_statement(filter);
        self.conn.fetch_all(&stmt).await.origin("AdministrativeActivityRepository->list")
    }

    /// Fetch and lock the row for a status change.
    pub async fn get_for_update(&mut self, id: i32) -> Result<Option<AdministrativeActivityRecord>, SqlError> {
        let mut stmt = SqlStatement::new(ACTIVITY_SELECT);
        stmt.push_sql(" WHERE aa.administrative_activity_id = ")
            .push_bind(id)
            .push_sql(" FOR UPDATE OF aa");
        self.conn.fetch_optional(&stmt).await.origin("AdministrativeActivityRepository->get_for_update")
    }

    pub async fn set_status(&mut self, id: i32, status: ActivityStatus, notes: Option<&str>) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new(
            "UPDATE administrative_activity SET administrative_activity_status_type_id = \
             (SELECT administrative_activity_status_type_id FROM administrative_activity_status_type WHERE name = ",
        );
        stmt.push_bind(status.name())
            .push_sql("), notes = COALESCE(")
            .push_bind(notes)
            .push_sql(", notes), assigned_system_user_id = ")
            .push_bind(self.conn.system_user_id())
            .push_sql(", update_date = now() WHERE administrative_activity_id = ")
            .push_bind(id);
        self.conn.execute(&stmt).await.origin("AdministrativeActivityRepository->set_status")
    }
}
