use crate::database::connection::DbConnection;
use crate::database::models::report::{AppStatistics, ProjectReportRow, ReportRange};
use crate::database::repository::report::ReportRepository;
use crate::error::{ApiError, ApiResult};

pub struct ReportService<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> ReportService<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub async fn app_statistics(&mut self) -> ApiResult<AppStatistics> {
        Ok(ReportRepository::new(self.conn).app_statistics().await?)
    }

    pub async fn project_report(&mut self, range: &ReportRange) -> ApiResult<Vec<ProjectReportRow>> {
        if let (Some(start), Some(end)) = (range.start_date, range.end_date) {
            if end < start {
                return Err(ApiError::invalid_field("end_date", "must not be before the start date"));
            }
        }
        Ok(ReportRepository::new(self.conn).project_report(range).await?)
    }
}
