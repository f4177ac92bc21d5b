use std::collections::HashMap;

use axum::{
    extract::{Path, Query, Request, State},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use tracing::warn;

use crate::auth::AuthPrincipal;
use crate::authorization::{authorize as decide, rules::RuleBuilder, Decision, RouteParams};
use crate::error::ApiError;

/// The rule a single route is guarded by, with the pool its project-role
/// lookups run against.
#[derive(Clone)]
pub struct RouteGuard {
    pub pool: PgPool,
    pub rule: RuleBuilder,
}

impl RouteGuard {
    pub fn new(pool: PgPool, rule: RuleBuilder) -> Self {
        Self { pool, rule }
    }
}

/// Build the route's rule from its parameters and evaluate it before the
/// handler runs.
pub async fn authorize(
    State(guard): State<RouteGuard>,
    path: Option<Path<HashMap<String, String>>>,
    Query(query): Query<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let params = RouteParams::new(path.map(|Path(p)| p).unwrap_or_default(), query);
    let rule = (guard.rule)(&params);
    let principal = request.extensions().get::<AuthPrincipal>();

    let decision = decide(principal, &rule, &guard.pool).await.map_err(|e| {
        warn!(error = %e, "Access rule evaluation failed");
        ApiError::internal_server_error("Failed to evaluate access")
    })?;

    match decision {
        Decision::Allow => Ok(next.run(request).await),
        Decision::Unauthenticated => Err(ApiError::unauthorized("Access Denied")),
        Decision::Forbidden => Err(ApiError::forbidden("Access Denied")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::rules;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Extension, Router};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn principal(system_user_id: Option<i32>, roles: &[&str]) -> AuthPrincipal {
        AuthPrincipal {
            user_identifier: "jdoe".into(),
            identity_source: "IDIR".into(),
            username: "jdoe@idir".into(),
            email: None,
            display_name: None,
            system_user_id,
            system_roles: roles.iter().map(|r| r.to_string()).collect(),
            record_active: true,
            has_project_roles: false,
        }
    }

    // Pool never connects: none of these paths reach the database.
    fn router(rule: RuleBuilder, caller: Option<AuthPrincipal>) -> Router {
        let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/unused").unwrap();
        let guard = RouteGuard::new(pool, rule);
        let router = Router::new().route(
            "/project/:projectId/view",
            get(|| async { "ok" }).route_layer(from_fn_with_state(guard, authorize)),
        );
        match caller {
            Some(p) => router.layer(Extension(p)),
            None => router,
        }
    }

    async fn status(router: Router) -> StatusCode {
        let request = axum::http::Request::builder()
            .uri("/project/7/view")
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn unresolved_callers_are_unauthorized() {
        assert_eq!(status(router(rules::system_user, None)).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(router(rules::system_user, Some(principal(None, &[])))).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn pending_users_are_forbidden() {
        let caller = principal(Some(3), &[]);
        assert_eq!(status(router(rules::system_user, Some(caller))).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn system_roles_pass_without_project_lookups() {
        let maintainer = principal(Some(3), &["Maintainer"]);
        assert_eq!(status(router(rules::project_viewer, Some(maintainer))).await, StatusCode::OK);

        let admin = principal(Some(1), &["System Administrator"]);
        assert_eq!(status(router(rules::project_lead, Some(admin))).await, StatusCode::OK);
    }
}
