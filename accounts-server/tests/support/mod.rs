#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use argon2::Params;
use axum_test::TestServer;
use serde_json::{Value, json};

use accounts_config::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig, DbWaitConfig,
    ServerConfig,
};
use accounts_core::{
    AuthCrypto, User, application::unit_of_work::AppUnitOfWork,
    domain::users::user::ExtraFields,
};
use accounts_server::{
    AppState,
    routes::{create_app, paths},
};

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        auth: AuthConfig {
            password_pepper: "test-pepper".into(),
            token_key: "test-token-key".into(),
        },
        cors: CorsConfig::default(),
        db_wait: DbWaitConfig {
            interval: Duration::from_millis(10),
            max_attempts: Some(1),
        },
        dev_mode: false,
        metadata: ConfigMetadata::default(),
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

/// Full router over fresh in-memory stores. Argon2 runs with minimal cost so
/// hashing does not dominate test time.
pub fn build_test_app() -> Result<TestApp> {
    let config = test_config();
    let crypto = AuthCrypto::with_params(
        &config.auth.password_pepper,
        &config.auth.token_key,
        Params::new(8, 1, 1, Some(32)).map_err(|err| anyhow!(err.to_string()))?,
    )
    .context("failed to build test crypto")?;

    let unit_of_work = AppUnitOfWork::in_memory();
    let state = AppState::new(&unit_of_work, Arc::new(crypto), Arc::new(config));
    let server = TestServer::new(create_app(state.clone()))
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(TestApp { server, state })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Seed a user directly through the manager.
pub async fn create_user(app: &TestApp, email: &str, password: &str, name: &str) -> Result<User> {
    let user = app
        .state
        .users
        .create_user(email, Some(password), ExtraFields::named(name))
        .await?;
    Ok(user)
}

pub async fn create_staff(app: &TestApp, email: &str, password: &str) -> Result<User> {
    let user = app
        .state
        .users
        .create_superuser(email, Some(password), ExtraFields::named("Staff"))
        .await?;
    Ok(user)
}

/// Staff member without superuser rights.
pub async fn create_staff_only(app: &TestApp, email: &str, password: &str) -> Result<User> {
    let extra = ExtraFields {
        is_staff: true,
        ..ExtraFields::named("Support")
    };
    let user = app
        .state
        .users
        .create_user(email, Some(password), extra)
        .await?;
    Ok(user)
}

/// Log in through the API and return the issued token.
pub async fn login(app: &TestApp, email: &str, password: &str) -> Result<String> {
    let response = app
        .server
        .post(paths::user::TOKEN)
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["token"]
        .as_str()
        .map(str::to_string)
        .context("token missing from response")
}
