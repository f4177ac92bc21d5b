use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DraftRecord {
    pub webform_draft_id: i32,
    pub system_user_id: i32,
    pub is_project: bool,
    pub name: String,
    pub data: Value,
    pub create_date: DateTime<Utc>,
    pub update_date: Option<DateTime<Utc>>,
}

/// Row returned by draft inserts and updates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DraftTimestamps {
    pub webform_draft_id: i32,
    pub create_date: Option<DateTime<Utc>>,
    pub update_date: Option<DateTime<Utc>>,
}

/// `{ id, date }`, where `date` is the last update, else the creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftResponse {
    pub id: i32,
    pub date: Option<DateTime<Utc>>,
}

impl From<DraftTimestamps> for DraftResponse {
    fn from(row: DraftTimestamps) -> Self {
        Self {
            id: row.webform_draft_id,
            date: row.update_date.or(row.create_date),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftCreateRequest {
    #[serde(default = "default_is_project")]
    pub is_project: bool,
    pub name: String,
    pub data: Value,
}

fn default_is_project() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftUpdateRequest {
    pub id: i32,
    pub name: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DraftListItem {
    pub id: i32,
    pub is_project: bool,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
}

/// Persisted draft shape returned to the wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftView {
    pub id: i32,
    pub is_project: bool,
    pub name: String,
    pub data: Value,
}

impl From<DraftRecord> for DraftView {
    fn from(row: DraftRecord) -> Self {
        Self {
            id: row.webform_draft_id,
            is_project: row.is_project,
            name: row.name,
            data: row.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_prefers_update_over_create() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let both = DraftTimestamps { webform_draft_id: 3, create_date: Some(created), update_date: Some(updated) };
        assert_eq!(DraftResponse::from(both), DraftResponse { id: 3, date: Some(updated) });

        let created_only = DraftTimestamps { webform_draft_id: 3, create_date: Some(created), update_date: None };
        assert_eq!(DraftResponse::from(created_only).date, Some(created));

        let updated_only = DraftTimestamps { webform_draft_id: 3, create_date: None, update_date: Some(updated) };
        assert_eq!(DraftResponse::from(updated_only).date, Some(updated));
    }

    #[test]
    fn create_request_defaults_to_project() {
        let request: DraftCreateRequest =
            serde_json::from_value(serde_json::json!({"name": "My draft", "data": {"step": 2}})).unwrap();
        assert!(request.is_project);
    }
}
