use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use accounts_core::domain::users::validation::FieldErrors;
use accounts_core::error::AccountError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    /// Per-field validation messages, rendered under `error.fields`
    pub fields: Option<FieldErrors>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// 400 carrying field-keyed messages.
    pub fn validation(fields: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".to_string(),
            fields: Some(fields),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fields {
            Some(fields) => write!(f, "{}: {}", self.message, fields),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "message": self.message,
            "status": self.status.as_u16(),
        });
        if let Some(fields) = &self.fields {
            error["fields"] = json!(fields);
        }

        let mut response = (self.status, Json(json!({ "error": error }))).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(err) => Self::validation(err.into()),
            AccountError::InvalidFields(fields) => Self::validation(fields),
            AccountError::Conflict(msg) => Self::conflict(msg),
            AccountError::NotFound(msg) => Self::not_found(msg),
            AccountError::Unavailable(msg) => {
                tracing::error!(error = %msg, "storage unavailable");
                Self::unavailable("Service temporarily unavailable")
            }
            AccountError::Crypto(err) => {
                tracing::error!(error = %err, "credential hashing failed");
                Self::internal("Internal server error")
            }
            AccountError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(fields: FieldErrors) -> Self {
        Self::validation(fields)
    }
}

// Every body problem is a client error here, including wrong content type
// and type mismatches axum would report as 415/422.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = ?err, "database operation failed");
        Self::internal("Database operation failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounts_core::domain::users::validation::ValidationError;

    #[test]
    fn validation_errors_become_400_with_fields() {
        let err = AppError::from(AccountError::Validation(ValidationError::InvalidEmail));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let fields = err.fields.expect("fields");
        assert!(fields.contains("email"));
    }

    #[test]
    fn unauthorized_carries_challenge_header() {
        let response = AppError::unauthorized("nope").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::from(AccountError::Internal("pool exploded".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("pool"));
    }
}
