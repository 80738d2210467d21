use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::users::user::{User, UserFilter};
use crate::error::Result;

// Account records plus their password credentials
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Persist a new user; `None` stores no credential (unusable password).
    /// Fails with `AccountError::Conflict` when the email is taken.
    async fn create_user_with_password(
        &self,
        user: &User,
        password_hash: Option<&str>,
    ) -> Result<()>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// `email` must already be normalized.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;

    async fn get_user_password_hash(&self, user_id: Uuid) -> Result<Option<String>>;
    async fn update_user_password(&self, user_id: Uuid, password_hash: &str) -> Result<()>;
    /// Store the user row and the new credential together, or neither.
    async fn update_user_and_password(&self, user: &User, password_hash: &str) -> Result<()>;

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()>;
}
