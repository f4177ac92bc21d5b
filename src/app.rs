use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthError, TokenVerifier};
use crate::authorization::rules::{self, RuleBuilder};
use crate::config::AppConfig;
use crate::database::manager::DatabaseManager;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{authenticate, authorize, RouteGuard};
use crate::services::{CodeSetSource, NotifyService, RegionService};
use crate::storage::FileStorage;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared by every handler. Cloned per request, so everything in it is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenVerifier>,
    pub codes: Arc<dyn CodeSetSource>,
    pub files: FileStorage,
    pub notifier: NotifyService,
    pub regions: RegionService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn from_config(pool: PgPool, config: &AppConfig) -> Result<Self, AuthError> {
        Ok(Self {
            tokens: Arc::new(TokenVerifier::from_config(&config.security.keycloak)?),
            codes: Arc::new(pool.clone()),
            files: FileStorage::from_config(&config.storage, &config.virus_scan, config.api.max_upload_size_bytes),
            notifier: NotifyService::from_config(&config.notify),
            regions: RegionService::from_config(&config.regions),
            config: Arc::new(config.clone()),
            pool,
        })
    }
}

/// Wrap a route in its access rule.
fn guarded(route: MethodRouter<AppState>, pool: &PgPool, rule: RuleBuilder) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(RouteGuard::new(pool.clone(), rule), authorize))
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();
    let upload_limit = config.api.max_upload_size_bytes + MULTIPART_OVERHEAD;
    let ceiling = config.api.max_request_size_bytes.max(upload_limit);

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes(&state, upload_limit))
        .merge(elevated_routes(&state))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(RequestBodyLimitLayer::new(ceiling));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if allowed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_origin(allowed).allow_methods(Any).allow_headers(Any)
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/codes", get(public::codes_get))
        .route("/public/projects", get(public::projects_list))
        .route("/public/project/:projectId/view", get(public::project_view))
        .route("/public/search", get(public::search_get))
        .route("/files/*key", get(public::file_get))
}

fn protected_routes(state: &AppState, upload_limit: usize) -> Router<AppState> {
    use protected::{access_request, attachment, draft, participant, project, search, spatial, user};
    let pool = &state.pool;

    Router::new()
        // Open to any authenticated caller, registered or not
        .route("/user/self", get(user::self_get))
        .route("/user/self/standing", get(user::standing_get))
        .route("/administrative-activity-request", post(access_request::access_request_create))
        // Drafts
        .route(
            "/draft",
            guarded(post(draft::draft_create).put(draft::draft_update), pool, rules::system_user),
        )
        .route("/drafts", guarded(get(draft::drafts_list), pool, rules::system_user))
        .route("/draft/:draftId", guarded(get(draft::draft_get), pool, rules::system_user))
        .route("/draft/:draftId/delete", guarded(delete(draft::draft_delete), pool, rules::system_user))
        .route(
            "/draft/:draftId/upload",
            guarded(
                post(draft::draft_upload).layer(DefaultBodyLimit::max(upload_limit)),
                pool,
                rules::system_user,
            ),
        )
        // Projects and plans
        .route("/project/create", guarded(post(project::project_create), pool, rules::project_creator))
        .route("/plan/create", guarded(post(project::plan_create), pool, rules::project_creator))
        .route("/projects", guarded(get(project::projects_list), pool, rules::system_user))
        .route("/plans", guarded(get(project::plans_list), pool, rules::system_user))
        .route("/project/:projectId/view", guarded(get(project::project_view), pool, rules::project_viewer))
        .route("/project/:projectId/update", guarded(put(project::project_update), pool, rules::project_editor))
        .route("/project/:projectId/publish", guarded(put(project::project_publish), pool, rules::project_lead))
        .route(
            "/project/:projectId/unpublish",
            guarded(put(project::project_unpublish), pool, rules::project_lead),
        )
        .route("/project/:projectId/delete", guarded(delete(project::project_delete), pool, rules::project_lead))
        // Participants
        .route(
            "/project/:projectId/participants",
            guarded(get(participant::participants_list), pool, rules::project_viewer)
                .merge(guarded(post(participant::participant_add), pool, rules::project_lead)),
        )
        .route(
            "/project/:projectId/participants/:participationId",
            guarded(delete(participant::participant_remove), pool, rules::project_lead),
        )
        .route(
            "/project/:projectId/participants/:participationId/role",
            guarded(put(participant::participant_role_update), pool, rules::project_lead),
        )
        // Attachments
        .route(
            "/project/:projectId/attachments/upload",
            guarded(
                post(attachment::attachment_upload).layer(DefaultBodyLimit::max(upload_limit)),
                pool,
                rules::project_editor,
            ),
        )
        .route(
            "/project/:projectId/attachments/list",
            guarded(get(attachment::attachments_list), pool, rules::project_viewer),
        )
        .route(
            "/project/:projectId/attachments/:attachmentId/getSignedUrl",
            guarded(get(attachment::attachment_signed_url), pool, rules::project_viewer),
        )
        .route(
            "/project/:projectId/attachments/:attachmentId/delete",
            guarded(delete(attachment::attachment_delete), pool, rules::project_editor),
        )
        // Search and spatial helpers
        .route("/search", guarded(get(search::search_get), pool, rules::system_user))
        .route("/spatial/point", guarded(post(spatial::point_convert), pool, rules::system_user))
        .route("/spatial/regions", guarded(post(spatial::regions_lookup), pool, rules::system_user))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}

fn elevated_routes(state: &AppState) -> Router<AppState> {
    use elevated::{administrative_activity, report, user};
    let pool = &state.pool;

    Router::new()
        .route(
            "/administrative-activities",
            guarded(get(administrative_activity::activities_list), pool, rules::maintainer),
        )
        .route(
            "/administrative-activity/:activityId/approve",
            guarded(put(administrative_activity::activity_approve), pool, rules::administrator),
        )
        .route(
            "/administrative-activity/:activityId/reject",
            guarded(put(administrative_activity::activity_reject), pool, rules::administrator),
        )
        .route("/users", guarded(get(user::users_list), pool, rules::administrator))
        .route("/user/add", guarded(post(user::user_add), pool, rules::administrator))
        .route("/user/:userId", guarded(get(user::user_get), pool, rules::administrator))
        .route("/user/:userId/delete", guarded(delete(user::user_remove), pool, rules::administrator))
        .route(
            "/user/:userId/system-roles",
            guarded(post(user::user_roles_add), pool, rules::administrator),
        )
        .route(
            "/user/:userId/system-roles/:roleId",
            guarded(delete(user::user_role_remove), pool, rules::administrator),
        )
        .route("/reports/app-statistics", guarded(get(report::app_statistics), pool, rules::maintainer))
        .route("/reports/projects", guarded(get(report::project_report), pool, rules::maintainer))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Restoration Tracker API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": "/codes, /public/projects, /public/project/:projectId/view, /public/search, /files/*key",
            "user": "/user/self, /user/self/standing, /administrative-activity-request",
            "drafts": "/draft, /drafts, /draft/:draftId[/delete|/upload]",
            "projects": "/project/create, /plan/create, /projects, /plans, /project/:projectId/*",
            "search": "/search, /spatial/point, /spatial/regions",
            "admin": "/users, /user/*, /administrative-activities, /administrative-activity/:activityId/*, /reports/*",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database": "unavailable",
                "database_error": e.to_string()
            })),
        ),
    }
}
