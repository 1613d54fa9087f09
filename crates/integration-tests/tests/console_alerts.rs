//! Integration tests for the alert lifecycle and the dashboard.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use watchpost_integration_tests::TestApp;

fn acknowledge_uri(id: i64) -> String {
    format!("/api/alerts/{id}/acknowledge")
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_raise_then_acknowledge_twice() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let id = app.raise_alert(3, None).await;

    let listed = app.get("/api/alerts", Some(&token)).await;
    let alert = &listed.body["alerts"][0];
    assert_eq!(alert["id"], id);
    assert_eq!(alert["camera_id"], 3);
    assert_eq!(alert["acknowledged"], false);
    assert!(alert["acknowledged_at"].is_null());

    let first = app.post(&acknowledge_uri(id), Some(&token), json!({})).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["ok"], true);
    assert_eq!(first.body["alert"]["acknowledged"], true);
    let acknowledged_at = first.body["alert"]["acknowledged_at"].clone();
    assert!(acknowledged_at.is_string());

    let second = app.post(&acknowledge_uri(id), Some(&token), json!({})).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["ok"], true);
    assert_eq!(second.body["alert"]["acknowledged_at"], acknowledged_at);

    let listed = app.get("/api/alerts", Some(&token)).await;
    assert_eq!(listed.body["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(listed.body["alerts"][0]["acknowledged_at"], acknowledged_at);
}

#[tokio::test]
async fn test_operator_can_acknowledge() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.create_user(&admin, "guard@site.test", "guard-secret", false)
        .await;
    let operator = app.login("guard@site.test", "guard-secret").await;
    let id = app.raise_alert(1, Some(7)).await;

    let response = app
        .post(&acknowledge_uri(id), Some(&operator), json!({}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["alert"]["person_id"], 7);
}

#[tokio::test]
async fn test_acknowledge_unknown_alert_is_not_found() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app.post(&acknowledge_uri(404), Some(&token), json!({})).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "not_found");
}

#[tokio::test]
async fn test_acknowledge_requires_session() {
    let app = TestApp::new().await;
    let id = app.raise_alert(2, None).await;

    let response = app.post(&acknowledge_uri(id), None, json!({})).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let alert = app
        .state
        .alerts()
        .list()
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    assert!(!alert.acknowledged);
}

#[tokio::test]
async fn test_single_alert_lookup() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let id = app.raise_alert(4, Some(2)).await;

    let found = app.get(&format!("/api/alerts/{id}"), Some(&token)).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["id"], id);
    assert_eq!(found.body["camera_id"], 4);
    assert_eq!(found.body["acknowledged"], false);

    let missing = app.get("/api/alerts/9999", Some(&token)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let anonymous = app.get(&format!("/api/alerts/{id}"), None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_alerts_are_listed_newest_first() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let older = app.raise_alert(1, None).await;
    let newer = app.raise_alert(2, None).await;

    let response = app.get("/api/alerts", Some(&token)).await;
    let ids: Vec<i64> = response.body["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();

    assert_eq!(ids, [newer, older]);
}

#[tokio::test]
async fn test_concurrent_acknowledgments_settle_on_one_timestamp() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let id = app.raise_alert(5, None).await;
    let uri = acknowledge_uri(id);

    let (a, b) = tokio::join!(
        app.post(&uri, Some(&token), json!({})),
        app.post(&uri, Some(&token), json!({}))
    );

    assert_eq!(a.status, StatusCode::OK);
    assert_eq!(b.status, StatusCode::OK);
    assert_eq!(
        a.body["alert"]["acknowledged_at"],
        b.body["alert"]["acknowledged_at"]
    );
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
async fn test_dashboard_counts_open_alerts() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let id = app.raise_alert(1, None).await;
    app.raise_alert(2, None).await;
    app.post(&acknowledge_uri(id), Some(&token), json!({})).await;

    let response = app.get("/api/dashboard", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["stats"]["alerts"], 2);
    assert_eq!(response.body["stats"]["unacknowledged_alerts"], 1);
    assert_eq!(response.body["ai_mode"], false);
}

#[tokio::test]
async fn test_ai_mode_toggles() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let on = app.post("/api/ai-mode/toggle", Some(&token), json!({})).await;
    assert_eq!(on.body["ai_mode"], true);

    let dashboard = app.get("/api/dashboard", Some(&token)).await;
    assert_eq!(dashboard.body["ai_mode"], true);

    let off = app.post("/api/ai-mode/toggle", Some(&token), json!({})).await;
    assert_eq!(off.body["ai_mode"], false);
}

#[tokio::test]
async fn test_ai_mode_toggle_requires_session() {
    let app = TestApp::new().await;

    let response = app.post("/api/ai-mode/toggle", None, json!({})).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(!app.state.ai_mode().is_enabled());
}
