use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;

use restoration_tracker_api::auth::KeycloakClaims;
use restoration_tracker_api::config::AppConfig;
use restoration_tracker_api::database::error::SqlError;
use restoration_tracker_api::database::models::code::{AllCodeSets, Code};
use restoration_tracker_api::database::DatabaseManager;
use restoration_tracker_api::services::CodeSetSource;
use restoration_tracker_api::{app, AppState};

pub const SECRET: &str = "integration-test-secret";

/// Code tables served without a database.
pub struct StubCodes(pub Option<AllCodeSets>);

#[async_trait]
impl CodeSetSource for StubCodes {
    async fn all_code_sets(&self) -> Result<Option<AllCodeSets>, SqlError> {
        Ok(self.0.clone())
    }
}

/// Where the in-process server keeps uploaded objects.
pub fn storage_root() -> std::path::PathBuf {
    std::env::temp_dir().join("restoration-tracker-tests")
}

pub struct TestServer {
    pub base_url: String,
}

/// Serve the router in-process against a database that is never reachable.
/// Anything that gets past authentication and touches the pool fails fast.
pub async fn spawn(codes: Option<AllCodeSets>) -> Result<TestServer> {
    let mut config = AppConfig::development();
    config.database.url = Some("postgres://postgres@127.0.0.1:1/restoration".to_string());
    config.database.connection_timeout = 1;
    config.api.enable_request_logging = false;
    config.security.keycloak.jwt_secret = Some(SECRET.to_string());
    config.storage.root_dir = storage_root().display().to_string();

    let pool = DatabaseManager::connect_lazy(&config.database)?;
    let mut state = AppState::from_config(pool, &config)?;
    state.codes = Arc::new(StubCodes(codes));

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    let server = TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// A token the server accepts, for an IDIR user.
pub fn token_for(username: &str) -> String {
    token_signed_with(username, SECRET)
}

pub fn token_signed_with(username: &str, secret: &str) -> String {
    let claims = KeycloakClaims {
        sub: Some(format!("{}-sub", username)),
        preferred_username: format!("{}@idir", username),
        email: Some(format!("{}@example.com", username)),
        display_name: Some(username.to_string()),
        identity_provider: Some("idir".to_string()),
        idir_user_guid: None,
        bceid_user_guid: None,
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).expect("token encodes")
}

pub fn sample_codes() -> AllCodeSets {
    let code = |id: i32, name: &str| Code { id, name: name.to_string() };
    AllCodeSets {
        funding_source: vec![code(1, "Provincial")],
        investment_action_category: vec![],
        iucn_conservation_action_level_1_classification: vec![code(1, "Land/water protection")],
        iucn_conservation_action_level_2_subclassification: vec![],
        iucn_conservation_action_level_3_subclassification: vec![],
        system_roles: vec![code(1, "System Administrator"), code(2, "Maintainer")],
        project_roles: vec![code(1, "Lead Editor")],
        administrative_activity_status_type: vec![code(1, "Pending")],
        ranges: vec![],
    }
}
