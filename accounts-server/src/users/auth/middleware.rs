use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use accounts_core::User;

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

/// Caller resolved from a bearer token; inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Both `Bearer` and the older `Token` scheme are accepted.
const SCHEMES: [&str; 2] = ["Bearer ", "Token "];

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided."))?;

    let user = state
        .auth_service
        .resolve_token(&token)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid token."))?;

    if !user.is_active {
        debug!(user_id = %user.id, "Rejected token of inactive user");
        return Err(AppError::unauthorized("User inactive or deleted."));
    }

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Must run after [`auth_middleware`].
pub async fn require_staff(request: Request, next: Next) -> AppResult<Response> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided."))?;

    if !user.0.is_staff {
        return Err(AppError::forbidden(
            "You do not have permission to perform this action.",
        ));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    SCHEMES
        .iter()
        .find_map(|scheme| value.strip_prefix(scheme))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn with_auth(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn accepts_bearer_and_token_schemes() {
        assert_eq!(extract_bearer_token(&with_auth("Bearer abc")).as_deref(), Some("abc"));
        assert_eq!(extract_bearer_token(&with_auth("Token abc")).as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert!(extract_bearer_token(&with_auth("Basic abc")).is_none());
        assert!(extract_bearer_token(&with_auth("Bearer ")).is_none());
        let bare = Request::builder().body(Body::empty()).unwrap();
        assert!(extract_bearer_token(&bare).is_none());
    }
}
