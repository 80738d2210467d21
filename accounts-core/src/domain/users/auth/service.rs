use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::token::AuthToken;
use crate::database::ports::auth_tokens::{AuthTokenRepository, StoredToken};
use crate::domain::users::manager::UserManager;
use crate::domain::users::user::User;
use crate::error::{AccountError, Result};

/// Credential checks and bearer-token lifecycle.
#[derive(Clone)]
pub struct AuthenticationService {
    manager: UserManager,
    tokens: Arc<dyn AuthTokenRepository>,
    crypto: Arc<super::AuthCrypto>,
}

impl fmt::Debug for AuthenticationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationService")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl AuthenticationService {
    pub fn new(
        manager: UserManager,
        tokens: Arc<dyn AuthTokenRepository>,
        crypto: Arc<super::AuthCrypto>,
    ) -> Self {
        Self {
            manager,
            tokens,
            crypto,
        }
    }

    /// Resolve an email/password pair to an active user.
    ///
    /// Unknown email, wrong password, unusable password and inactive account
    /// all yield `None`; callers must not tell them apart.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.manager.get_by_email(email).await? else {
            debug!("Authentication failed: unknown email");
            return Ok(None);
        };

        if !self.manager.check_password(&user, password).await? {
            debug!(user_id = %user.id, "Authentication failed: bad password");
            return Ok(None);
        }

        if !user.is_active {
            debug!(user_id = %user.id, "Authentication failed: inactive account");
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Token for `user`, minted on first login and handed back unchanged on
    /// every later one. Stamps `last_login` either way.
    pub async fn issue_token(&self, user: &User) -> Result<AuthToken> {
        let fresh = AuthToken::generate()
            .map_err(|err| AccountError::Internal(err.to_string()))?;
        let candidate = StoredToken {
            user_id: user.id,
            token_hash: self.crypto.hash_token(fresh.as_str()),
            sealed_token: self.crypto.seal_token(fresh.as_str())?,
            created_at: fresh.created_at(),
        };

        let bound = self.tokens.get_or_create(&candidate).await?;
        let token = if bound.token_hash == candidate.token_hash {
            info!(user_id = %user.id, "Issued auth token");
            fresh
        } else {
            let raw = self.crypto.open_token(&bound.sealed_token)?;
            debug!(user_id = %user.id, "Returning existing auth token");
            AuthToken::restore(raw, bound.created_at)
                .map_err(|err| AccountError::Internal(err.to_string()))?
        };

        self.manager.record_login(user.id, Utc::now()).await?;
        Ok(token)
    }

    /// Look up the owner of a presented token. Malformed or unknown tokens
    /// resolve to `None`; activity is the caller's concern.
    pub async fn resolve_token(&self, raw: &str) -> Result<Option<User>> {
        if !AuthToken::is_well_formed(raw) {
            return Ok(None);
        }

        let digest = self.crypto.hash_token(raw);
        let Some(stored) = self.tokens.find_by_hash(&digest).await? else {
            return Ok(None);
        };

        self.manager.get_by_id(stored.user_id).await
    }

    /// Drop the user's token, if any. Returns whether one existed.
    pub async fn revoke_tokens(&self, user_id: Uuid) -> Result<bool> {
        let revoked = self.tokens.delete_for_user(user_id).await?;
        if revoked {
            info!(user_id = %user_id, "Revoked auth token");
        }
        Ok(revoked)
    }

    pub fn manager(&self) -> &UserManager {
        &self.manager
    }
}
