use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectCounts {
    pub total_projects: i64,
    pub published_projects: i64,
    pub total_plans: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AreaTotals {
    pub total_area_ha: Option<f64>,
    pub total_sites: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserCounts {
    pub total_users: i64,
    pub pending_access_requests: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FundingTotals {
    pub total_funding: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStatistics {
    pub total_projects: i64,
    pub published_projects: i64,
    pub total_plans: i64,
    pub total_area_ha: Option<f64>,
    pub total_sites: Option<i64>,
    pub total_users: i64,
    pub pending_access_requests: i64,
    pub total_funding: Option<f64>,
}

impl AppStatistics {
    pub fn combine(projects: ProjectCounts, area: AreaTotals, users: UserCounts, funding: FundingTotals) -> Self {
        Self {
            total_projects: projects.total_projects,
            published_projects: projects.published_projects,
            total_plans: projects.total_plans,
            total_area_ha: area.total_area_ha,
            total_sites: area.total_sites,
            total_users: users.total_users,
            pending_access_requests: users.pending_access_requests,
            total_funding: funding.total_funding,
        }
    }
}

/// One row of the project report. Absent values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectReportRow {
    pub project_id: i32,
    pub name: String,
    pub state_code: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub objectives: Option<String>,
    pub people_involved: Option<i32>,
    pub number_sites: Option<i64>,
    pub size_ha: Option<f64>,
    pub funding_total: Option<f64>,
    pub primary_contact_email: Option<String>,
    pub create_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_report_values_serialize_as_null() {
        let row = ProjectReportRow {
            project_id: 1,
            name: "Caribou".into(),
            state_code: 2,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            objectives: None,
            people_involved: None,
            number_sites: None,
            size_ha: None,
            funding_total: None,
            primary_contact_email: None,
            create_date: Utc::now(),
        };
        let json = serde_json::to_value(&row).unwrap();
        for field in ["end_date", "objectives", "people_involved", "number_sites", "size_ha", "funding_total"] {
            assert!(json[field].is_null(), "{} should be null", field);
            assert!(json.as_object().unwrap().contains_key(field));
        }
    }
}
