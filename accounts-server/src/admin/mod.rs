//! Staff-only JSON administration of user accounts.

pub mod handlers;

use axum::{Router, middleware, routing::get};

use crate::infra::app_state::AppState;
use crate::routes::paths;
use crate::users::auth::{auth_middleware, require_staff};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(paths::admin::USER_CHANGELIST, get(handlers::list_users_handler))
        .route(
            paths::admin::USER_CHANGE,
            get(handlers::get_user_handler).patch(handlers::update_user_handler),
        )
        // Layers run outermost-last: authenticate, then check staff.
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
