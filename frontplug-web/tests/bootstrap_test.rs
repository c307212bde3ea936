//! Bootstrap page integration tests

mod helpers;

use frontplug_access::UserRecord;
use frontplug_core::ConfigStore;
use helpers::{bootstrap_data, default_tree, spawn_app, spawn_app_with};
use serde_json::{json, Value};

fn bob() -> UserRecord {
    UserRecord::new("bob")
        .with_display_name("Bob")
        .with_roles(["staff", "editors"])
}

#[tokio::test]
async fn test_gui_with_session_cookie() {
    let app = spawn_app().await;
    let token = app.token_for(&bob());

    let response = app
        .get_with_headers("/gui", &[("Cookie", format!("token={}", token).as_str())])
        .await;
    assert_eq!(response.status(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let html = response.text().await.unwrap();
    assert!(html.contains("<title>Cells Test</title>"));

    let data = bootstrap_data(&html);
    assert_eq!(data["entry"], "gui");
    assert_eq!(data["noClaims"], false);
    assert_eq!(data["user"]["login"], "bob");
    assert_eq!(
        data["workspaceScopes"],
        json!(["common", "projects", "hr", "personal"])
    );
    assert_eq!(data["aclActions"]["upload"], true);
    assert_eq!(data["aclActions"]["download"], true);
    assert_eq!(data["aclParameters"]["theme"], "material");
}

#[tokio::test]
async fn test_gui_with_bearer_header() {
    let app = spawn_app().await;
    let token = app.token_for(&bob());

    let response = app
        .get_with_headers("/gui", &[("Authorization", format!("Bearer {}", token).as_str())])
        .await;
    assert_eq!(response.status(), 200);
    let data = bootstrap_data(&response.text().await.unwrap());
    assert_eq!(data["user"]["displayName"], "Bob");
}

#[tokio::test]
async fn test_gui_without_session_has_no_claims() {
    let app = spawn_app().await;

    let response = app.get("/gui").await;
    assert_eq!(response.status(), 200);

    let data = bootstrap_data(&response.text().await.unwrap());
    assert_eq!(data["noClaims"], true);
    assert_eq!(data["user"], Value::Null);
    assert_eq!(data["workspaceScopes"], json!([]));
}

#[tokio::test]
async fn test_gui_with_invalid_session_is_unauthorized() {
    let app = spawn_app().await;

    let response = app
        .get_with_headers("/gui", &[("Cookie", "token=forged.jwt.value")])
        .await;
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_token");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_gui_with_non_bearer_authorization_is_unauthorized() {
    let app = spawn_app().await;

    let response = app
        .get_with_headers("/gui", &[("Authorization", "Basic Ym9iOnNlY3JldA==")])
        .await;
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "malformed_credentials");
}

#[tokio::test]
async fn test_gui_with_blank_bearer_is_anonymous() {
    let app = spawn_app().await;

    let response = app
        .get_with_headers("/gui", &[("Authorization", "Bearer ")])
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(bootstrap_data(&response.text().await.unwrap())["noClaims"], true);
}

#[tokio::test]
async fn test_reset_password_page() {
    let app = spawn_app().await;

    let response = app.get("/user/reset-password/3f9c2a").await;
    assert_eq!(response.status(), 200);

    let data = bootstrap_data(&response.text().await.unwrap());
    assert_eq!(data["entry"], "reset_password");
    assert_eq!(data["resetPasswordKey"], "3f9c2a");
    assert_eq!(data["noClaims"], true);
}

#[tokio::test]
async fn test_reset_password_rejects_invalid_session() {
    let app = spawn_app().await;

    let response = app
        .get_with_headers("/user/reset-password/3f9c2a", &[("Cookie", "token=forged")])
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_public_link_does_not_leak_session_identity() {
    let app = spawn_app().await;
    let token = app.token_for(&bob());

    let response = app
        .get_with_headers("/public/abc123", &[("Cookie", format!("token={}", token).as_str())])
        .await;
    assert_eq!(response.status(), 200);

    let html = response.text().await.unwrap();
    assert!(!html.contains("\"bob\""));

    let data = bootstrap_data(&html);
    assert_eq!(data["noClaims"], true);
    assert_eq!(data["user"], Value::Null);
    assert_eq!(data["workspaceScopes"], json!(["W1"]));
    assert_eq!(data["aclActions"]["download"], false);
    assert_eq!(data["publicLink"], "abc123");
}

#[tokio::test]
async fn test_public_link_ignores_broken_credentials() {
    let app = spawn_app().await;

    let response = app
        .get_with_headers(
            "/public/abc123",
            &[("Authorization", "Basic Ym9iOnNlY3JldA=="), ("Cookie", "token=forged")],
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(bootstrap_data(&response.text().await.unwrap())["noClaims"], true);
}

#[tokio::test]
async fn test_unknown_public_link() {
    let app = spawn_app().await;

    let response = app.get("/public/does-not-exist").await;
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "unknown_link");
}

#[tokio::test]
async fn test_locale_negotiation() {
    let app = spawn_app().await;

    let data = bootstrap_data(&app.get("/gui?lang=fr").await.text().await.unwrap());
    assert_eq!(data["lang"], "fr");

    let data = bootstrap_data(&app.get("/gui").await.text().await.unwrap());
    assert_eq!(data["lang"], "en");

    let data = bootstrap_data(&app.get("/gui?lang=fr&lang=de").await.text().await.unwrap());
    assert_eq!(data["lang"], "fr");

    let data = bootstrap_data(&app.get("/gui?foo=1&lang=fr").await.text().await.unwrap());
    assert_eq!(data["lang"], "fr");

    let html = app
        .get_with_headers(
            "/gui",
            &[("Cookie", "lang=de"), ("Accept-Language", "it-IT,it;q=0.9")],
        )
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"<html lang="de">"#));

    let data = bootstrap_data(
        &app.get_with_headers("/gui", &[("Accept-Language", "pt_BR, pt;q=0.8")])
            .await
            .text()
            .await
            .unwrap(),
    );
    assert_eq!(data["lang"], "pt-br");
}

#[tokio::test]
async fn test_supported_languages_restrict_negotiation() {
    let app = spawn_app_with(default_tree(), |config| {
        config.default_language = "en".to_string();
        config.supported_languages = vec!["en".to_string(), "fr".to_string()];
    })
    .await;

    let data = bootstrap_data(&app.get("/gui?lang=ja").await.text().await.unwrap());
    assert_eq!(data["lang"], "en");
}

#[tokio::test]
async fn test_extraneous_configuration_never_reaches_the_page() {
    let app = spawn_app().await;
    let token = app.token_for(&bob());

    for path in ["/gui", "/public/abc123", "/user/reset-password/k"] {
        let html = app
            .get_with_headers(path, &[("Cookie", format!("token={}", token).as_str())])
            .await
            .text()
            .await
            .unwrap();

        for leaked in ["hunter2", "DB_PASSWORD", "format_disk", "mailpass", "pydio.grpc.mailer"] {
            assert!(!html.contains(leaked), "{} leaked into {}", leaked, path);
        }
    }
}

#[tokio::test]
async fn test_configuration_changes_apply_to_next_request() {
    let app = spawn_app().await;

    app.store
        .set(json!("Renamed"), &["frontend", "plugin", "core.pydio", "APPLICATION_TITLE"])
        .await
        .unwrap();
    app.store.save("admin", "Rename application").await.unwrap();

    let html = app.get("/gui").await.text().await.unwrap();
    assert!(html.contains("<title>Renamed</title>"));
    assert_eq!(bootstrap_data(&html)["configVersion"], 1);
}

#[tokio::test]
async fn test_robots_txt() {
    let app = spawn_app().await;

    let response = app.get("/robots.txt").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.text().await.unwrap(), "User-agent: *\nDisallow: /");
}
