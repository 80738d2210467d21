pub mod auth;
pub mod handlers;
pub mod serializers;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::infra::app_state::AppState;
use crate::routes::paths;
use auth::middleware::auth_middleware;

/// `/api/user/*`: public registration and login, token-guarded profile.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route(paths::user::CREATE, post(handlers::create_user_handler))
        .route(paths::user::TOKEN, post(handlers::create_token_handler));

    let protected = Router::new()
        .route(
            paths::user::ME,
            get(handlers::get_me_handler)
                .patch(handlers::patch_me_handler)
                .put(handlers::put_me_handler),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}
