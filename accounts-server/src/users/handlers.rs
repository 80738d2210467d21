use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;

use accounts_core::{
    AccountError,
    domain::users::{
        user::{ExtraFields, UserUpdate},
        validation::FieldErrors,
    },
};

use super::auth::AuthenticatedUser;
use super::serializers::{
    AUTHENTICATION_FAILED, CreateUserRequest, DUPLICATE_EMAIL, TokenRequest,
    TokenResponse, UpdateMeRequest, UserResponse,
};
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

/// `POST /api/user/create`
pub async fn create_user_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let Json(request) = payload?;
    let account = request.validate()?;

    let user = state
        .users
        .create_user(
            account.email.as_str(),
            Some(&account.password),
            ExtraFields::named(account.name),
        )
        .await
        .map_err(|err| match err {
            AccountError::Conflict(_) => {
                let mut fields = FieldErrors::new();
                fields.add("email", DUPLICATE_EMAIL);
                AppError::validation(fields)
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// `POST /api/user/token`
pub async fn create_token_handler(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(request) = payload?;
    let credentials = request.validate()?;

    let user = state
        .auth_service
        .authenticate(&credentials.email, &credentials.password)
        .await?
        .ok_or_else(|| AppError::validation(FieldErrors::non_field(AUTHENTICATION_FAILED)))?;

    let token = state.auth_service.issue_token(&user).await?;

    Ok(Json(TokenResponse {
        token: token.into_string(),
    }))
}

/// `GET /api/user/me`
pub async fn get_me_handler(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// `PATCH /api/user/me`
pub async fn patch_me_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    payload: Result<Json<UpdateMeRequest>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    update_me(state, caller, payload, true).await
}

/// `PUT /api/user/me`
pub async fn put_me_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    payload: Result<Json<UpdateMeRequest>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    update_me(state, caller, payload, false).await
}

async fn update_me(
    state: AppState,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<UpdateMeRequest>, JsonRejection>,
    partial: bool,
) -> AppResult<Json<UserResponse>> {
    let Json(request) = payload?;
    let changes = request.validate(partial)?;

    let updated = state
        .users
        .update_profile(
            user.id,
            UserUpdate {
                name: changes.name,
                ..UserUpdate::default()
            },
            changes.password.as_deref(),
        )
        .await?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(UserResponse::from(&updated)))
}
