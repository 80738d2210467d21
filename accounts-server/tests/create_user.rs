#[path = "support/mod.rs"]
mod support;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};

use accounts_server::routes::paths;
use support::build_test_app;

#[tokio::test]
async fn create_user_returns_public_fields() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post(paths::user::CREATE)
        .json(&json!({
            "email": "test@example.com",
            "password": "testpass123",
            "name": "Test Name",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body, json!({ "email": "test@example.com", "name": "Test Name" }));
    assert!(body.get("password").is_none());

    let user = app
        .state
        .users
        .get_by_email("test@example.com")
        .await?
        .expect("user persisted");
    assert!(app.state.users.check_password(&user, "testpass123").await?);
    Ok(())
}

#[tokio::test]
async fn create_user_lowercases_email() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post(paths::user::CREATE)
        .json(&json!({ "email": "Test2@EXAMPLE.com", "password": "testpass123" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["email"], "test2@example.com");
    assert_eq!(body["name"], "");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_field_error() -> Result<()> {
    let app = build_test_app()?;
    support::create_user(&app, "test@example.com", "testpass123", "First").await?;

    let response = app
        .server
        .post(paths::user::CREATE)
        .json(&json!({ "email": "TEST@example.com", "password": "otherpass", "name": "Second" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(
        body["error"]["fields"]["email"][0],
        "user with this email already exists."
    );
    Ok(())
}

#[tokio::test]
async fn short_password_is_rejected_and_nothing_is_stored() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post(paths::user::CREATE)
        .json(&json!({ "email": "test@example.com", "password": "pw", "name": "Test" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"]["fields"]["password"].is_array());
    assert!(app.state.users.get_by_email("test@example.com").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_reported_together() -> Result<()> {
    let app = build_test_app()?;

    let response = app.server.post(paths::user::CREATE).json(&json!({})).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 400);
    assert_eq!(body["error"]["fields"]["email"][0], "This field is required.");
    assert_eq!(body["error"]["fields"]["password"][0], "This field is required.");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post(paths::user::CREATE)
        .text("{\"email\": ")
        .content_type("application/json")
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"]["message"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let app = build_test_app()?;

    let response = app.server.get(paths::HEALTH).await;

    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));
    Ok(())
}
