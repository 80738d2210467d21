use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use accounts_core::domain::users::{
    user::{User, UserFilter, UserUpdate},
    validation::{FieldErrors, MAX_NAME_CHARS, ValidationError},
};

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::users::auth::AuthenticatedUser;

/// One row of the change list, also the change-form payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for AdminUserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeList {
    pub count: usize,
    pub results: Vec<AdminUserView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeListQuery {
    /// Case-insensitive search over email and name
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_staff: Option<bool>,
    #[serde(default)]
    pub is_superuser: Option<bool>,
}

impl AdminUserUpdate {
    fn validate(self) -> Result<UserUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(name) = self.name.as_deref()
            && name.chars().count() > MAX_NAME_CHARS
        {
            errors.push(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_CHARS,
            });
        }

        errors.into_result(UserUpdate {
            name: self.name,
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        })
    }
}

/// `GET /admin/core/user/`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(query): Query<ChangeListQuery>,
) -> AppResult<Json<ChangeList>> {
    let filter = UserFilter { search: query.q };
    let results: Vec<AdminUserView> = state
        .users
        .list(&filter)
        .await?
        .into_iter()
        .map(AdminUserView::from)
        .collect();

    Ok(Json(ChangeList {
        count: results.len(),
        results,
    }))
}

/// `GET /admin/core/user/{id}/change/`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AdminUserView>> {
    let user = state
        .users
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(user.into()))
}

/// `PATCH /admin/core/user/{id}/change/`
///
/// Only superusers may change accounts; other staff get read-only access.
/// Deactivating an account also revokes its token, so the change takes
/// effect immediately rather than at the next login.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(admin)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AdminUserUpdate>, JsonRejection>,
) -> AppResult<Json<AdminUserView>> {
    if !admin.is_superuser {
        warn!(admin_id = %admin.id, user_id = %id, "Non-superuser attempted an admin change");
        return Err(AppError::forbidden(
            "You do not have permission to perform this action.",
        ));
    }

    let Json(request) = payload?;
    let update = request.validate()?;
    let deactivating = update.is_active == Some(false);

    let user = state.users.update_user(id, update).await?;

    if deactivating {
        state.auth_service.revoke_tokens(user.id).await?;
    }

    info!(admin_id = %admin.id, user_id = %user.id, "Admin updated user");
    Ok(Json(user.into()))
}
