mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let server = common::spawn(None).await?;
    let body: Value = reqwest::get(server.url("/")).await?.json().await?;
    assert_eq!(body["name"], "Restoration Tracker API");
    assert!(body["endpoints"]["public"].as_str().unwrap_or_default().contains("/codes"));
    Ok(())
}

#[tokio::test]
async fn codes_are_served_without_a_token() -> Result<()> {
    let codes = common::sample_codes();
    let server = common::spawn(Some(codes.clone())).await?;

    let res = reqwest::get(server.url("/codes")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, serde_json::to_value(&codes)?);
    Ok(())
}

#[tokio::test]
async fn missing_code_sets_are_a_server_error() -> Result<()> {
    let server = common::spawn(None).await?;

    let res = reqwest::get(server.url("/codes")).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], 500);
    assert_eq!(body["message"], "Failed to fetch codes");
    Ok(())
}

#[tokio::test]
async fn health_reports_an_unreachable_database() -> Result<()> {
    let server = common::spawn(None).await?;

    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await?;
    assert_eq!(body["database"], "unavailable");
    Ok(())
}

#[tokio::test]
async fn signed_file_urls_serve_stored_objects() -> Result<()> {
    use restoration_tracker_api::config::AppConfig;
    use restoration_tracker_api::storage::UrlSigner;

    let server = common::spawn(None).await?;
    let dir = common::storage_root().join("projects").join("41");
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("plan.txt"), b"restoration plan")?;

    let storage = AppConfig::development().storage;
    let signer = UrlSigner::new(server.url("/files"), storage.signing_secret, 300);
    let url = signer.sign("projects/41/plan.txt");

    let res = reqwest::get(&url).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await?.as_ref(), b"restoration plan");

    let tampered = url.replace("projects/41", "projects/42");
    assert_eq!(reqwest::get(&tampered).await?.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn signed_file_urls_survive_reserved_characters() -> Result<()> {
    use restoration_tracker_api::config::AppConfig;
    use restoration_tracker_api::storage::UrlSigner;

    let server = common::spawn(None).await?;
    let dir = common::storage_root().join("projects").join("77");
    std::fs::create_dir_all(&dir)?;

    let storage = AppConfig::development().storage;
    let signer = UrlSigner::new(server.url("/files"), storage.signing_secret, 300);

    for name in ["plain.txt", "a b.txt", "a#b.txt", "what?.txt", "100%.txt"] {
        std::fs::write(dir.join(name), name.as_bytes())?;
        let res = reqwest::get(signer.sign(&format!("projects/77/{}", name))).await?;
        assert_eq!(res.status(), StatusCode::OK, "{}", name);
        assert_eq!(res.bytes().await?.as_ref(), name.as_bytes());
    }
    Ok(())
}
