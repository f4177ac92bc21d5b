use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::ProjectState;
use crate::database::models::report::{
    AppStatistics, AreaTotals, FundingTotals, ProjectCounts, ProjectReportRow, ReportRange, UserCounts,
};
use crate::database::sql::SqlStatement;

/// Reporting queries. Each statistic is its own named query.
pub struct ReportRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> ReportRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub async fn project_counts(&mut self) -> Result<ProjectCounts, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT count(*) FILTER (WHERE is_project) AS total_projects, \
             count(*) FILTER (WHERE is_project AND state_code = ",
        );
        stmt.push_bind(ProjectState::Published.code())
            .push_sql(") AS published_projects, count(*) FILTER (WHERE NOT is_project) AS total_plans FROM project WHERE state_code <> ")
            .push_bind(ProjectState::Archived.code());
        self.conn
            .fetch_one(&stmt, "Failed to count projects")
            .await
            .origin("ReportRepository->project_counts")
    }

    /// Boundary components only; masks restate the same sites.
    pub fn area_totals_statement() -> SqlStatement {
        let mut stmt = SqlStatement::new(
            "SELECT sum(psc.size_ha)::float8 AS total_area_ha, sum(psc.number_sites)::int8 AS total_sites \
             FROM project_spatial_component psc JOIN project p ON p.project_id = psc.project_id \
             WHERE psc.component_type = 'Boundary' AND p.state_code <> ",
        );
        stmt.push_bind(ProjectState::Archived.code());
        stmt
    }

    pub async fn area_totals(&mut self) -> Result<AreaTotals, SqlError> {
        let stmt = Self::area_totals_statement();
        self.conn
            .fetch_one(&stmt, "Failed to total project areas")
            .await
            .origin("ReportRepository->area_totals")
    }

    pub async fn user_counts(&mut self) -> Result<UserCounts, SqlError> {
        let stmt = SqlStatement::new(
            "SELECT (SELECT count(*) FROM system_user WHERE record_end_date IS NULL) AS total_users, \
             (SELECT count(*) FROM administrative_activity aa \
               JOIN administrative_activity_status_type s \
                 ON s.administrative_activity_status_type_id = aa.administrative_activity_status_type_id \
               WHERE s.name = 'Pending') AS pending_access_requests",
        );
        self.conn
            .fetch_one(&stmt, "Failed to count users")
            .await
            .origin("ReportRepository->user_counts")
    }

    pub fn funding_totals_statement() -> SqlStatement {
        let mut stmt = SqlStatement::new(
            "SELECT sum(pfs.funding_amount)::float8 AS total_funding FROM project_funding_source pfs \
             JOIN project p ON p.project_id = pfs.project_id WHERE p.state_code <> ",
        );
        stmt.push_bind(ProjectState::Archived.code());
        stmt
    }

    pub async fn funding_totals(&mut self) -> Result<FundingTotals, SqlError> {
        let stmt = Self::funding_totals_statement();
        self.conn
            .fetch_one(&stmt, "Failed to total funding")
            .await
            .origin("ReportRepository->funding_totals")
    }

    pub async fn app_statistics(&mut self) -> Result<AppStatistics, SqlError> {
        let projects = self.project_counts().await?;
        let area = self.area_totals().await?;
        let users = self.user_counts().await?;
        let funding = self.funding_totals().await?;
        Ok(AppStatistics::combine(projects, area, users, funding))
    }

    pub fn project_report_statement(range: &ReportRange) -> SqlStatement {
        let mut stmt = SqlStatement::new(
            "SELECT p.project_id, p.name, p.state_code, p.start_date, p.end_date, p.objectives, p.people_involved, \
             (SELECT sum(number_sites)::int8 FROM project_spatial_component \
               WHERE project_id = p.project_id AND component_type = 'Boundary') AS number_sites, \
             (SELECT sum(size_ha)::float8 FROM project_spatial_component \
               WHERE project_id = p.project_id AND component_type = 'Boundary') AS size_ha, \
             (SELECT sum(funding_amount)::float8 FROM project_funding_source WHERE project_id = p.project_id) AS funding_total, \
             (SELECT email_address FROM project_contact WHERE project_id = p.project_id AND is_primary LIMIT 1) AS primary_contact_email, \
             p.create_date FROM project p WHERE p.is_project AND p.state_code <> ",
        );
        stmt.push_bind(ProjectState::Archived.code());
        if let Some(start) = range.start_date {
            stmt.push_sql(" AND p.start_date >= ").push_bind(start);
        }
        if let Some(end) = range.end_date {
            stmt.push_sql(" AND p.start_date <= ").push_bind(end);
        }
        stmt.push_sql(" ORDER BY p.project_id");
        stmt
    }

    pub async fn project_report(&mut self, range: &ReportRange) -> Result<Vec<ProjectReportRow>, SqlError> {
        let stmt = Self::project_report_statement(range);
        self.conn.fetch_all(&stmt).await.origin("ReportRepository->project_report")
    }
}
