use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use tracing::debug;

use crate::app::AppState;
use crate::auth::{bearer_token, AuthPrincipal};
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::user::{SystemUserRecord, UserStanding};
use crate::database::repository::user::UserRepository;
use crate::error::ApiError;

/// Verify the bearer token and attach the caller's [`AuthPrincipal`].
///
/// A valid token for a user the database does not know still passes, with
/// no system user id; route guards decide what such a caller may do.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = bearer_token(header)?;
    let claims = state.tokens.verify(token)?;

    let mut principal = AuthPrincipal::from_claims(&claims);
    resolve_principal(&state.pool, &mut principal).await?;
    debug!(
        user = %principal.user_identifier,
        system_user_id = ?principal.system_user_id,
        "Authenticated request"
    );

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Fill in the system user fields from the database.
pub async fn resolve_principal(pool: &PgPool, principal: &mut AuthPrincipal) -> Result<(), SqlError> {
    let stmt = UserRepository::find_by_identifier_statement(&principal.user_identifier, &principal.identity_source);
    let user: Option<SystemUserRecord> = stmt.fetch_optional(pool).await.origin("authenticate->resolve_principal")?;
    let Some(user) = user else {
        return Ok(());
    };

    let standing: UserStanding = UserRepository::standing_statement(user.system_user_id)
        .fetch_optional(pool)
        .await
        .origin("authenticate->resolve_principal")?
        .unwrap_or(UserStanding {
            has_pending_access_request: false,
            has_one_or_more_project_roles: false,
        });

    principal.record_active = user.is_active();
    principal.system_user_id = Some(user.system_user_id);
    principal.system_roles = user.role_names;
    principal.has_project_roles = standing.has_one_or_more_project_roles;
    if principal.email.is_none() {
        principal.email = user.email;
    }
    Ok(())
}
