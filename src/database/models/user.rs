use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SystemUserRecord {
    pub system_user_id: i32,
    pub user_identifier: String,
    pub identity_source: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub record_end_date: Option<NaiveDate>,
    pub role_names: Vec<String>,
}

impl SystemUserRecord {
    pub fn is_active(&self) -> bool {
        self.record_end_date.is_none()
    }
}

/// `(has_pending_access_request, has_one_or_more_project_roles)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserStanding {
    pub has_pending_access_request: bool,
    pub has_one_or_more_project_roles: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreateRequest {
    pub user_identifier: String,
    pub identity_source: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub roles: Vec<String>,
}
