// handlers/protected/access_request.rs - POST /administrative-activity-request

use axum::extract::{Extension, Json, State};
use serde_json::Value;

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::administrative_activity::ActivityResponse;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AdministrativeActivityService;

/// Request access to the application.
///
/// Open to any authenticated caller, registered or not: an unknown caller
/// is added as a system user first. Responds `{ id, date }`. Administrators
/// are emailed once the request is committed.
pub async fn access_request_create(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(data): Json<Value>,
) -> ApiResult<ActivityResponse> {
    let created = with_transaction(&state.pool, Some(&principal), {
        let principal = principal.clone();
        let data = data.clone();
        move |conn| {
            Box::pin(async move {
                AdministrativeActivityService::new(conn)
                    .create_access_request(Some(&principal), &data)
                    .await
            })
        }
    })
    .await?;

    state.notifier.access_requested(&principal.user_identifier, &data).await;
    Ok(ApiResponse::success(created))
}
