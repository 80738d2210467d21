use thiserror::Error;

use crate::domain::users::auth::AuthCryptoError;
use crate::domain::users::validation::{FieldErrors, ValidationError};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid input: {0}")]
    InvalidFields(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Crypto(#[from] AuthCryptoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FieldErrors> for AccountError {
    fn from(errors: FieldErrors) -> Self {
        AccountError::InvalidFields(errors)
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for AccountError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_) => AccountError::Unavailable(err.to_string()),
            other => AccountError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AccountError>;
