use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::AuthCrypto;
use super::email::Email;
use super::user::{ExtraFields, User, UserFilter, UserUpdate};
use crate::database::ports::users::UsersRepository;
use crate::error::{AccountError, Result};

/// The only sanctioned way to create a persisted [`User`].
///
/// Normalizes the email and hashes the password before anything reaches the
/// store. Also owns the password operations on existing users, so nothing
/// else needs access to the hashing helper.
#[derive(Clone)]
pub struct UserManager {
    users: Arc<dyn UsersRepository>,
    crypto: Arc<AuthCrypto>,
}

impl std::fmt::Debug for UserManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserManager")
            .field("crypto", &self.crypto)
            .finish_non_exhaustive()
    }
}

impl UserManager {
    pub fn new(users: Arc<dyn UsersRepository>, crypto: Arc<AuthCrypto>) -> Self {
        Self { users, crypto }
    }

    /// Create and persist a user.
    ///
    /// `password: None` leaves the account with an unusable password: no
    /// credential is stored and every check fails. Fails with
    /// [`AccountError::Validation`] for a blank or malformed email and with
    /// [`AccountError::Conflict`] when the email is already registered.
    pub async fn create_user(
        &self,
        email: &str,
        password: Option<&str>,
        extra: ExtraFields,
    ) -> Result<User> {
        let email = Email::parse(email)?;

        let password_hash = password
            .map(|raw| self.crypto.hash_password(raw))
            .transpose()?;

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email: email.into_string(),
            name: extra.name.unwrap_or_default(),
            is_active: extra.is_active.unwrap_or(true),
            is_staff: extra.is_staff,
            is_superuser: extra.is_superuser,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        self.users
            .create_user_with_password(&user, password_hash.as_deref())
            .await?;

        info!(
            user_id = %user.id,
            usable_password = password_hash.is_some(),
            "User created"
        );
        Ok(user)
    }

    /// Same as [`create_user`](Self::create_user) with `is_staff` and
    /// `is_superuser` forced on, whatever `extra` says.
    pub async fn create_superuser(
        &self,
        email: &str,
        password: Option<&str>,
        extra: ExtraFields,
    ) -> Result<User> {
        let extra = ExtraFields {
            is_staff: true,
            is_superuser: true,
            ..extra
        };
        self.create_user(email, password, extra).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.users.get_user_by_id(id).await
    }

    /// Lookup is by normalized email, so case and padding are ignored.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.get_user_by_email(&Email::normalize(email)).await
    }

    /// Users ordered by id, narrowed by `filter`.
    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>> {
        self.users.list_users(filter).await
    }

    pub async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.users.record_login(user_id, at).await
    }

    /// False for unusable passwords and for stored hashes that fail to parse.
    pub async fn check_password(&self, user: &User, raw: &str) -> Result<bool> {
        let Some(hash) = self.users.get_user_password_hash(user.id).await? else {
            return Ok(false);
        };

        match self.crypto.verify_password(raw, &hash) {
            Ok(matches) => Ok(matches),
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "Stored password hash is unreadable");
                Ok(false)
            }
        }
    }

    pub async fn set_password(&self, user_id: Uuid, raw: &str) -> Result<()> {
        let hash = self.crypto.hash_password(raw)?;
        self.users.update_user_password(user_id, &hash).await?;
        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Apply a partial update and return the stored result.
    pub async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> Result<User> {
        let mut user = self
            .users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User {user_id}")))?;

        if update.is_empty() {
            return Ok(user);
        }

        update.apply(&mut user);
        self.users.update_user(&user).await?;

        self.users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User {user_id}")))
    }

    /// [`update_user`](Self::update_user) plus an optional new password.
    ///
    /// The password is hashed before anything is written and both changes
    /// land in one repository call, so a failure leaves the account as it was.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: UserUpdate,
        password: Option<&str>,
    ) -> Result<User> {
        let Some(password) = password else {
            return self.update_user(user_id, update).await;
        };
        let hash = self.crypto.hash_password(password)?;

        let mut user = self
            .users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User {user_id}")))?;
        update.apply(&mut user);
        self.users.update_user_and_password(&user, &hash).await?;
        info!(user_id = %user_id, "Password changed");

        self.users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User {user_id}")))
    }
}
