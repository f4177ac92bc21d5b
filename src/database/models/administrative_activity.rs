use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

pub const SYSTEM_ACCESS: &str = "System Access";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    Pending,
    Actioned,
    Rejected,
}

impl ActivityStatus {
    pub fn name(self) -> &'static str {
        match self {
            ActivityStatus::Pending => "Pending",
            ActivityStatus::Actioned => "Actioned",
            ActivityStatus::Rejected => "Rejected",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Pending" => Some(ActivityStatus::Pending),
            "Actioned" => Some(ActivityStatus::Actioned),
            "Rejected" => Some(ActivityStatus::Rejected),
            _ => None,
        }
    }

    /// Only a pending activity may be resolved, and only once.
    pub fn can_transition_to(self, next: ActivityStatus) -> bool {
        matches!(
            (self, next),
            (ActivityStatus::Pending, ActivityStatus::Actioned) | (ActivityStatus::Pending, ActivityStatus::Rejected)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdministrativeActivityRecord {
    pub id: i32,
    pub type_name: String,
    pub status_name: String,
    pub reported_system_user_id: i32,
    pub description: Option<String>,
    pub data: Value,
    pub notes: Option<String>,
    pub create_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityCreated {
    pub id: i32,
    pub create_date: DateTime<Utc>,
}

/// `{ id, date }` returned from an access request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub id: i32,
    pub date: DateTime<Utc>,
}

impl From<ActivityCreated> for ActivityResponse {
    fn from(row: ActivityCreated) -> Self {
        Self { id: row.id, date: row.create_date }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub status: Option<String>,
}

/// Body of `PUT /administrative-activity/{id}/approve`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApprovalRequest {
    pub roles: Vec<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_activities_transition() {
        use ActivityStatus::*;
        assert!(Pending.can_transition_to(Actioned));
        assert!(Pending.can_transition_to(Rejected));
        for from in [Actioned, Rejected] {
            for to in [Pending, Actioned, Rejected] {
                assert!(!from.can_transition_to(to));
            }
        }
        assert!(!Pending.can_transition_to(Pending));
    }
}
