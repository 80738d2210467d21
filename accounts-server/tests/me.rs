#[path = "support/mod.rs"]
mod support;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};

use accounts_core::domain::users::user::UserUpdate;
use accounts_server::routes::paths;
use support::{bearer, build_test_app, create_user, login};

#[tokio::test]
async fn me_requires_authentication() -> Result<()> {
    let app = build_test_app()?;

    let response = app.server.get(paths::user::ME).await;

    response.assert_status_unauthorized();
    assert_eq!(response.header("www-authenticate"), "Bearer");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let app = build_test_app()?;

    app.server
        .get(paths::user::ME)
        .add_header("Authorization", bearer("not-a-token"))
        .await
        .assert_status_unauthorized();
    Ok(())
}

#[tokio::test]
async fn me_returns_exactly_name_and_email() -> Result<()> {
    let app = build_test_app()?;
    create_user(&app, "test@example.com", "testpass123", "Test Name").await?;
    let token = login(&app, "test@example.com", "testpass123").await?;

    let response = app
        .server
        .get(paths::user::ME)
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "name": "Test Name", "email": "test@example.com" }));
    Ok(())
}

#[tokio::test]
async fn token_scheme_prefix_is_accepted() -> Result<()> {
    let app = build_test_app()?;
    create_user(&app, "test@example.com", "testpass123", "Test").await?;
    let token = login(&app, "test@example.com", "testpass123").await?;

    app.server
        .get(paths::user::ME)
        .add_header("Authorization", format!("Token {token}"))
        .await
        .assert_status_ok();
    Ok(())
}

#[tokio::test]
async fn post_to_me_is_not_allowed() -> Result<()> {
    let app = build_test_app()?;
    create_user(&app, "test@example.com", "testpass123", "Test").await?;
    let token = login(&app, "test@example.com", "testpass123").await?;

    app.server
        .post(paths::user::ME)
        .add_header("Authorization", bearer(&token))
        .json(&json!({}))
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn patch_updates_name_and_password() -> Result<()> {
    let app = build_test_app()?;
    create_user(&app, "test@example.com", "testpass123", "Test").await?;
    let token = login(&app, "test@example.com", "testpass123").await?;

    let response = app
        .server
        .patch(paths::user::ME)
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "name": "new name", "password": "newpassword123" }))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "name": "new name", "email": "test@example.com" }));

    let user = app
        .state
        .users
        .get_by_email("test@example.com")
        .await?
        .expect("user exists");
    assert_eq!(user.name, "new name");
    assert!(app.state.users.check_password(&user, "newpassword123").await?);
    assert!(!app.state.users.check_password(&user, "testpass123").await?);

    login(&app, "test@example.com", "newpassword123").await?;
    Ok(())
}

#[tokio::test]
async fn patch_ignores_email_changes() -> Result<()> {
    let app = build_test_app()?;
    create_user(&app, "test@example.com", "testpass123", "Test").await?;
    let token = login(&app, "test@example.com", "testpass123").await?;

    let response = app
        .server
        .patch(paths::user::ME)
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "email": "other@example.com" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["email"], "test@example.com");
    Ok(())
}

#[tokio::test]
async fn patch_rejects_short_password() -> Result<()> {
    let app = build_test_app()?;
    create_user(&app, "test@example.com", "testpass123", "Test").await?;
    let token = login(&app, "test@example.com", "testpass123").await?;

    let response = app
        .server
        .patch(paths::user::ME)
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "password": "abc" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"]["fields"]["password"].is_array());

    login(&app, "test@example.com", "testpass123").await?;
    Ok(())
}

#[tokio::test]
async fn put_requires_every_field() -> Result<()> {
    let app = build_test_app()?;
    create_user(&app, "test@example.com", "testpass123", "Test").await?;
    let token = login(&app, "test@example.com", "testpass123").await?;

    let response = app
        .server
        .put(paths::user::ME)
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "name": "only name" }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["fields"]["password"][0], "This field is required.");

    app.server
        .put(paths::user::ME)
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "name": "full", "password": "replacement" }))
        .await
        .assert_status_ok();
    Ok(())
}

#[tokio::test]
async fn deactivated_user_token_stops_working() -> Result<()> {
    let app = build_test_app()?;
    let user = create_user(&app, "test@example.com", "testpass123", "Test").await?;
    let token = login(&app, "test@example.com", "testpass123").await?;

    app.state
        .users
        .update_user(
            user.id,
            UserUpdate {
                is_active: Some(false),
                ..UserUpdate::default()
            },
        )
        .await?;

    app.server
        .get(paths::user::ME)
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status_unauthorized();
    Ok(())
}
