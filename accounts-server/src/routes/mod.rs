pub mod paths;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use accounts_config::CorsConfig;

use crate::infra::app_state::AppState;
use crate::{admin, users};

/// Full application: API, admin and health routes with tracing and CORS.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors, state.config().dev_mode);

    Router::new()
        .route(paths::HEALTH, get(health_handler))
        .merge(users::router(state.clone()))
        .merge(admin::router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Permissive in dev mode; otherwise only the configured origins. An empty
/// list allows no cross-origin callers.
fn cors_layer(cors: &CorsConfig, dev_mode: bool) -> CorsLayer {
    if dev_mode {
        return CorsLayer::permissive();
    }

    let allow_origin = if cors.is_wildcard_included() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cors.allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
