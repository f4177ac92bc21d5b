mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::spawn(None).await?;
    let client = reqwest::Client::new();

    for path in ["/projects", "/user/self", "/drafts", "/users"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn non_bearer_headers_are_rejected() -> Result<()> {
    let server = common::spawn(None).await?;

    let res = reqwest::Client::new()
        .get(server.url("/projects"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], 401);
    Ok(())
}

#[tokio::test]
async fn tokens_signed_with_another_key_are_rejected() -> Result<()> {
    let server = common::spawn(None).await?;
    let token = common::token_signed_with("jdoe", "some-other-secret");

    let res = reqwest::Client::new()
        .get(server.url("/user/self"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn valid_tokens_need_the_database_to_resolve_the_caller() -> Result<()> {
    let server = common::spawn(None).await?;

    let res = reqwest::Client::new()
        .get(server.url("/user/self"))
        .bearer_auth(common::token_for("jdoe"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Database error occurred");
    Ok(())
}
