use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::NotifyConfig;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notify request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Notify rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct EmailNotification<'a> {
    email_address: &'a str,
    template_id: &'a str,
    personalisation: Value,
}

/// GC Notify email client. Without an API key every send is skipped.
#[derive(Debug, Clone)]
pub struct NotifyService {
    client: reqwest::Client,
    config: NotifyConfig,
}

impl NotifyService {
    pub fn from_config(config: &NotifyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Send one templated email. Returns `Ok(false)` when sending is disabled.
    pub async fn send_email(&self, template_id: &str, email: &str, personalisation: Value) -> Result<bool, NotifyError> {
        let Some(api_key) = &self.config.api_key else {
            return Ok(false);
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("ApiKey-v1 {}", api_key))
            .json(&EmailNotification {
                email_address: email,
                template_id,
                personalisation,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        info!(template_id, "Sent notification email");
        Ok(true)
    }

    /// Tell the administrators a user asked for access.
    pub async fn access_requested(&self, requester: &str, request: &Value) {
        let (Some(admin), Some(template)) = (&self.config.admin_email, &self.config.access_request_template) else {
            return;
        };
        let personalisation = json!({
            "requester": requester,
            "request": request,
            "url": format!("{}/admin/users", self.config.app_host.trim_end_matches('/')),
        });
        if let Err(e) = self.send_email(template, admin, personalisation).await {
            warn!(error = %e, "Failed to send access request notification");
        }
    }

    pub async fn access_approved(&self, email: &str, user_identifier: &str) {
        let Some(template) = &self.config.access_approval_template else {
            return;
        };
        let personalisation = json!({
            "user": user_identifier,
            "url": self.config.app_host,
        });
        if let Err(e) = self.send_email(template, email, personalisation).await {
            warn!(error = %e, "Failed to send access approval notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    fn config(api_url: String, api_key: Option<&str>) -> NotifyConfig {
        NotifyConfig {
            api_url,
            api_key: api_key.map(str::to_string),
            admin_email: Some("admin@example.com".into()),
            access_request_template: Some("tmpl-request".into()),
            access_approval_template: None,
            app_host: "https://restoration.example.com".into(),
        }
    }

    #[tokio::test]
    async fn disabled_without_an_api_key() {
        let notify = NotifyService::from_config(&config("http://127.0.0.1:1".into(), None));
        assert!(!notify.is_enabled());
        assert!(!notify.send_email("t", "a@example.com", json!({})).await.unwrap());
    }

    #[tokio::test]
    async fn posts_templated_email_with_api_key_header() {
        type Seen = Arc<Mutex<Vec<(String, Value)>>>;
        let seen: Seen = Arc::default();

        async fn capture(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            seen.lock().unwrap().push((auth, body));
            Json(json!({"id": "abc"}))
        }

        let app = Router::new()
            .route("/v2/notifications/email", post(capture))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let url = format!("http://{}/v2/notifications/email", addr);
        let notify = NotifyService::from_config(&config(url, Some("key-123")));
        notify.access_requested("jdoe", &json!({"reason": "field work"})).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "ApiKey-v1 key-123");
        assert_eq!(seen[0].1["email_address"], "admin@example.com");
        assert_eq!(seen[0].1["template_id"], "tmpl-request");
        assert_eq!(seen[0].1["personalisation"]["requester"], "jdoe");
    }
}
