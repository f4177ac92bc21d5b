use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Workflow state of a project or plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectState {
    Draft,
    Published,
    Completed,
    Archived,
}

impl ProjectState {
    pub fn code(self) -> i32 {
        match self {
            ProjectState::Draft => 1,
            ProjectState::Published => 2,
            ProjectState::Completed => 3,
            ProjectState::Archived => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ProjectState::Draft),
            2 => Some(ProjectState::Published),
            3 => Some(ProjectState::Completed),
            4 => Some(ProjectState::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectRecord {
    pub project_id: i32,
    pub is_project: bool,
    pub name: String,
    pub objectives: Option<String>,
    pub state_code: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_healing_land: bool,
    pub is_healing_people: bool,
    pub is_land_initiative: bool,
    pub is_cultural_initiative: bool,
    pub people_involved: Option<i32>,
    pub publish_timestamp: Option<DateTime<Utc>>,
    pub create_date: DateTime<Utc>,
    pub revision_count: i32,
}

/// Editable project fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub name: String,
    #[serde(default)]
    pub objectives: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_healing_land: bool,
    #[serde(default)]
    pub is_healing_people: bool,
    #[serde(default)]
    pub is_land_initiative: bool,
    #[serde(default)]
    pub is_cultural_initiative: bool,
    #[serde(default)]
    pub people_involved: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetailsUpdate {
    #[serde(flatten)]
    pub details: ProjectDetails,
    pub revision_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub agency: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRecord {
    pub project_contact_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub agency: String,
    pub is_public: bool,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingPayload {
    pub funding_source_id: i32,
    #[serde(default)]
    pub funding_project_id: Option<String>,
    pub funding_amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FundingRecord {
    pub project_funding_source_id: i32,
    pub funding_source_id: i32,
    pub funding_source_name: String,
    pub funding_project_id: Option<String>,
    pub funding_amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitPayload {
    pub permit_number: String,
    pub permit_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermitRecord {
    pub permit_id: i32,
    pub permit_number: String,
    pub permit_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IucnRecord {
    pub project_iucn_action_classification_id: i32,
    pub classification: i32,
    pub subclassification1: i32,
    pub subclassification2: i32,
}

/// Geometry submitted for a project boundary or mask.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationPayload {
    #[serde(default)]
    pub geometry: Vec<Value>,
    #[serde(default)]
    pub component_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number_sites: Option<i32>,
    #[serde(default)]
    pub size_ha: Option<f64>,
    #[serde(default)]
    pub is_within_overlapping: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpatialRecord {
    pub project_spatial_component_id: i32,
    pub component_type: String,
    pub name: Option<String>,
    pub geojson: Value,
    pub number_sites: Option<i32>,
    pub size_ha: Option<f64>,
    pub is_within_overlapping: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectCreateRequest {
    pub project: Option<ProjectDetails>,
    pub contacts: Vec<ContactPayload>,
    pub funding_sources: Vec<FundingPayload>,
    pub permits: Vec<PermitPayload>,
    pub partnerships: Vec<String>,
    pub iucn_classifications: Vec<i32>,
    pub focal_species: Vec<i32>,
    pub location: Option<LocationPayload>,
    pub draft_id: Option<i32>,
}

/// Sections present in the request are replaced; absent sections are left
/// alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectUpdateRequest {
    pub project: Option<ProjectDetailsUpdate>,
    pub contacts: Option<Vec<ContactPayload>>,
    pub funding_sources: Option<Vec<FundingPayload>>,
    pub permits: Option<Vec<PermitPayload>>,
    pub partnerships: Option<Vec<String>>,
    pub iucn_classifications: Option<Vec<i32>>,
    pub focal_species: Option<Vec<i32>>,
    pub location: Option<LocationPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub project: ProjectRecord,
    pub contacts: Vec<ContactRecord>,
    pub funding_sources: Vec<FundingRecord>,
    pub permits: Vec<PermitRecord>,
    pub partnerships: Vec<String>,
    pub iucn_classifications: Vec<IucnRecord>,
    pub focal_species: Vec<i32>,
    pub location: Vec<SpatialRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectListItem {
    pub project_id: i32,
    pub is_project: bool,
    pub name: String,
    pub state_code: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParticipantRecord {
    pub project_participation_id: i32,
    pub project_id: i32,
    pub system_user_id: i32,
    pub user_identifier: String,
    pub project_role_id: i32,
    pub project_role_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantPayload {
    pub system_user_id: i32,
    pub project_role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_round_trip() {
        for state in [ProjectState::Draft, ProjectState::Published, ProjectState::Completed, ProjectState::Archived] {
            assert_eq!(ProjectState::from_code(state.code()), Some(state));
        }
        assert_eq!(ProjectState::from_code(0), None);
    }

    #[test]
    fn update_request_keeps_absent_sections_absent() {
        let request: ProjectUpdateRequest = serde_json::from_value(serde_json::json!({
            "project": {"name": "Caribou", "start_date": "2024-01-01", "revision_count": 3},
            "contacts": []
        }))
        .unwrap();
        assert_eq!(request.project.unwrap().revision_count, 3);
        assert_eq!(request.contacts.map(|c| c.len()), Some(0));
        assert!(request.permits.is_none());
    }
}
