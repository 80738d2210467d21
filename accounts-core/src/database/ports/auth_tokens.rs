use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;

/// Persisted form of an issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub user_id: Uuid,
    /// HMAC-SHA-256 hex digest of the plaintext token, used for lookup
    pub token_hash: String,
    /// AES-GCM sealed plaintext, opened when the owner logs in again
    pub sealed_token: String,
    pub created_at: DateTime<Utc>,
}

// At most one token per user
#[async_trait]
pub trait AuthTokenRepository: Send + Sync {
    /// Bind `candidate` to its user unless the user already holds a token.
    /// Returns the token bound afterwards, which is the existing one if any.
    async fn get_or_create(&self, candidate: &StoredToken) -> Result<StoredToken>;
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<StoredToken>>;
    /// Returns whether a token was removed.
    async fn delete_for_user(&self, user_id: Uuid) -> Result<bool>;
}
