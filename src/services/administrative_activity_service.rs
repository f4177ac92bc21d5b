use serde_json::Value;
use tracing::info;

use crate::auth::{AuthPrincipal, SystemRole};
use crate::database::connection::DbConnection;
use crate::database::models::administrative_activity::{
    ActivityFilter, ActivityResponse, ActivityStatus, AdministrativeActivityRecord, ApprovalRequest,
};
use crate::database::models::user::SystemUserRecord;
use crate::database::repository::{administrative_activity::AdministrativeActivityRepository, user::UserRepository};
use crate::error::{ApiError, ApiResult};

use super::require_system_user_id;

pub struct AdministrativeActivityService<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> AdministrativeActivityService<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// Record a pending "System Access" request. A caller the database does
    /// not know yet is registered first and the connection rebound to them.
    pub async fn create_access_request(
        &mut self,
        principal: Option<&AuthPrincipal>,
        data: &Value,
    ) -> ApiResult<ActivityResponse> {
        if self.conn.system_user_id().is_none() {
            if let Some(principal) = principal {
                let id = UserRepository::new(self.conn)
                    .add(
                        &principal.user_identifier,
                        &principal.identity_source,
                        principal.email.as_deref(),
                        principal.display_name.as_deref(),
                    )
                    .await?;
                self.conn.set_system_user_id(id).await?;
                info!(system_user_id = id, "Registered system user from access request");
            }
        }

        let reporter = require_system_user_id(self.conn.system_user_id())?;
        let created = AdministrativeActivityRepository::new(self.conn)
            .create_access_request(reporter, data)
            .await?;
        Ok(created.into())
    }

    pub async fn list(&mut self, filter: &ActivityFilter) -> ApiResult<Vec<AdministrativeActivityRecord>> {
        if let Some(status) = &filter.status {
            if ActivityStatus::from_name(status).is_none() {
                return Err(ApiError::invalid_field("status", format!("unknown status '{}'", status)));
            }
        }
        Ok(AdministrativeActivityRepository::new(self.conn).list(filter).await?)
    }

    /// Grant the requested roles and mark the request Actioned. Returns the
    /// requester so they can be told.
    pub async fn approve(&mut self, activity_id: i32, approval: &ApprovalRequest) -> ApiResult<SystemUserRecord> {
        for role in &approval.roles {
            if SystemRole::from_name(role).is_none() {
                return Err(ApiError::invalid_field("roles", format!("unknown system role '{}'", role)));
            }
        }

        let activity = self.transition(activity_id, ActivityStatus::Actioned).await?;
        let requester = activity.reported_system_user_id;

        UserRepository::new(self.conn).add_roles(requester, &approval.roles).await?;
        AdministrativeActivityRepository::new(self.conn)
            .set_status(activity_id, ActivityStatus::Actioned, approval.notes.as_deref())
            .await?;

        info!(activity_id, requester, roles = ?approval.roles, "Approved access request");
        UserRepository::new(self.conn)
            .get(requester)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("System user {} not found", requester)))
    }

    pub async fn reject(&mut self, activity_id: i32, notes: Option<&str>) -> ApiResult<()> {
        self.transition(activity_id, ActivityStatus::Rejected).await?;
        AdministrativeActivityRepository::new(self.conn)
            .set_status(activity_id, ActivityStatus::Rejected, notes)
            .await?;
        info!(activity_id, "Rejected access request");
        Ok(())
    }

    /// Lock the activity and check `next` is reachable from its status.
    async fn transition(&mut self, activity_id: i32, next: ActivityStatus) -> ApiResult<AdministrativeActivityRecord> {
        let activity = AdministrativeActivityRepository::new(self.conn)
            .get_for_update(activity_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Administrative activity {} not found", activity_id)))?;

        let current = ActivityStatus::from_name(&activity.status_name).ok_or_else(|| {
            ApiError::internal_server_error(format!("Unknown activity status '{}'", activity.status_name))
        })?;
        check_transition(current, next)?;
        Ok(activity)
    }
}

fn check_transition(current: ActivityStatus, next: ActivityStatus) -> ApiResult<()> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(ApiError::conflict(format!(
            "Administrative activity is {}, cannot become {}",
            current.name(),
            next.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_activities_resolve() {
        assert!(check_transition(ActivityStatus::Pending, ActivityStatus::Actioned).is_ok());
        assert!(check_transition(ActivityStatus::Pending, ActivityStatus::Rejected).is_ok());

        for (from, to) in [
            (ActivityStatus::Actioned, ActivityStatus::Rejected),
            (ActivityStatus::Rejected, ActivityStatus::Actioned),
            (ActivityStatus::Actioned, ActivityStatus::Pending),
            (ActivityStatus::Pending, ActivityStatus::Pending),
        ] {
            assert_eq!(check_transition(from, to).unwrap_err().status_code(), 409);
        }
    }

    #[tokio::test]
    async fn unidentified_requesters_are_server_errors() {
        let mut conn = DbConnection::detached(None);
        let err = AdministrativeActivityService::new(&mut conn)
            .create_access_request(None, &serde_json::json!({"reason": "field work"}))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Failed to identify system user ID");
    }

    #[tokio::test]
    async fn unknown_requesters_are_registered_first() {
        let principal = AuthPrincipal {
            user_identifier: "jdoe".into(),
            identity_source: "IDIR".into(),
            username: "jdoe@idir".into(),
            email: None,
            display_name: None,
            system_user_id: None,
            system_roles: vec![],
            record_active: true,
            has_project_roles: false,
        };
        let mut conn = DbConnection::detached(None);
        let err = AdministrativeActivityService::new(&mut conn)
            .create_access_request(Some(&principal), &serde_json::json!({}))
            .await
            .unwrap_err();

        // registration is attempted before the id check
        assert_eq!(err.message(), "Database connection is not open");
    }
}
