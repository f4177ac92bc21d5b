// handlers/protected/user.rs - GET /user/self and /user/self/standing

use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::auth::AuthPrincipal;
use crate::database::connection::with_transaction;
use crate::database::models::user::UserStanding;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{user_service::SelfView, UserService};

/// GET /user/self - the caller's system user record, or what the token says
/// about an unregistered caller (with a null id).
pub async fn self_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<SelfView> {
    let view = with_transaction(&state.pool, Some(&principal), {
        let principal = principal.clone();
        move |conn| Box::pin(async move { UserService::new(conn).current(&principal).await })
    })
    .await?;
    Ok(ApiResponse::success(view))
}

/// GET /user/self/standing
pub async fn standing_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<UserStanding> {
    let standing = with_transaction(&state.pool, Some(&principal), {
        let principal = principal.clone();
        move |conn| Box::pin(async move { UserService::new(conn).standing(&principal).await })
    })
    .await?;
    Ok(ApiResponse::success(standing))
}
