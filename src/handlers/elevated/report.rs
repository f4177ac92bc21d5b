// handlers/elevated/report.rs - reporting endpoints

use axum::extract::{Extension, Query, State};

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::report::{AppStatistics, ProjectReportRow, ReportRange};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ReportService;

/// GET /reports/app-statistics
pub async fn app_statistics(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<AppStatistics> {
    let stats = with_transaction(&state.pool, Some(&principal), |conn| {
        Box::pin(async move { ReportService::new(conn).app_statistics().await })
    })
    .await?;
    Ok(ApiResponse::success(stats))
}

/// GET /reports/projects?start_date=&end_date=
pub async fn project_report(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Query(range): Query<ReportRange>,
) -> ApiResult<Vec<ProjectReportRow>> {
    let rows = with_transaction(&state.pool, Some(&principal), move |conn| {
        Box::pin(async move { ReportService::new(conn).project_report(&range).await })
    })
    .await?;
    Ok(ApiResponse::success(rows))
}
