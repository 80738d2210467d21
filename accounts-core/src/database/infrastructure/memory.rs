//! Process-local adapters for the repository ports.
//!
//! Used by the server's `--in-memory` dev mode and by tests. Each store keeps
//! its state behind one `RwLock`, so email uniqueness and create are a single
//! critical section.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::database::ports::{
    auth_tokens::{AuthTokenRepository, StoredToken},
    users::UsersRepository,
};
use crate::domain::users::user::{User, UserFilter};
use crate::error::{AccountError, Result};

#[derive(Debug, Default)]
struct UsersState {
    // Uuid v7 keys keep iteration in creation order
    users: BTreeMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    credentials: HashMap<Uuid, String>,
}

impl UsersState {
    /// Overwrite an existing user, keeping the email index in step.
    fn replace_user(&mut self, user: &User) -> Result<()> {
        let previous_email = self
            .users
            .get(&user.id)
            .map(|existing| existing.email.clone())
            .ok_or_else(|| AccountError::NotFound(format!("User {}", user.id)))?;

        if previous_email != user.email {
            if self.by_email.contains_key(&user.email) {
                return Err(AccountError::Conflict(
                    "Email already exists".to_string(),
                ));
            }
            self.by_email.remove(&previous_email);
            self.by_email.insert(user.email.clone(), user.id);
        }

        let mut stored = user.clone();
        stored.updated_at = Utc::now();
        self.users.insert(user.id, stored);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsersRepository {
    state: RwLock<UsersState>,
}

impl InMemoryUsersRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn create_user_with_password(
        &self,
        user: &User,
        password_hash: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if state.by_email.contains_key(&user.email) {
            return Err(AccountError::Conflict(
                "Email already exists".to_string(),
            ));
        }
        if state.users.contains_key(&user.id) {
            return Err(AccountError::Conflict(format!(
                "User {} already exists",
                user.id
            )));
        }

        state.by_email.insert(user.email.clone(), user.id);
        state.users.insert(user.id, user.clone());
        if let Some(hash) = password_hash {
            state.credentials.insert(user.id, hash.to_string());
        }

        info!(user_id = %user.id, "created user (in-memory)");
        Ok(())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .by_email
            .get(email)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        self.state.write().await.replace_user(user)
    }

    async fn get_user_password_hash(
        &self,
        user_id: Uuid,
    ) -> Result<Option<String>> {
        Ok(self.state.read().await.credentials.get(&user_id).cloned())
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(AccountError::NotFound(format!("User {user_id}")));
        }
        state.credentials.insert(user_id, password_hash.to_string());
        if let Some(user) = state.users.get_mut(&user_id) {
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_user_and_password(
        &self,
        user: &User,
        password_hash: &str,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.replace_user(user)?;
        state
            .credentials
            .insert(user.id, password_hash.to_string());
        Ok(())
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AccountError::NotFound(format!("User {user_id}")))?;
        user.last_login = Some(at);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TokensState {
    by_hash: HashMap<String, StoredToken>,
    by_user: HashMap<Uuid, String>,
}

#[derive(Debug, Default)]
pub struct InMemoryAuthTokenRepository {
    state: RwLock<TokensState>,
}

impl InMemoryAuthTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthTokenRepository for InMemoryAuthTokenRepository {
    async fn get_or_create(&self, candidate: &StoredToken) -> Result<StoredToken> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .by_user
            .get(&candidate.user_id)
            .and_then(|hash| state.by_hash.get(hash))
        {
            return Ok(existing.clone());
        }

        state
            .by_user
            .insert(candidate.user_id, candidate.token_hash.clone());
        state
            .by_hash
            .insert(candidate.token_hash.clone(), candidate.clone());
        Ok(candidate.clone())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<StoredToken>> {
        Ok(self.state.read().await.by_hash.get(token_hash).cloned())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.by_user.remove(&user_id) {
            Some(hash) => {
                state.by_hash.remove(&hash);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            email: email.to_string(),
            name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let repo = InMemoryUsersRepository::new();
        repo.create_user_with_password(&user("a@example.com"), Some("h"))
            .await
            .unwrap();

        let err = repo
            .create_user_with_password(&user("a@example.com"), Some("h"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Conflict(_)));
        assert_eq!(repo.list_users(&UserFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unusable_password_stores_no_credential() {
        let repo = InMemoryUsersRepository::new();
        let u = user("nopass@example.com");
        repo.create_user_with_password(&u, None).await.unwrap();
        assert_eq!(repo.get_user_password_hash(u.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejected_profile_write_keeps_the_old_password() {
        let repo = InMemoryUsersRepository::new();
        let taken = user("taken@example.com");
        let mut u = user("me@example.com");
        repo.create_user_with_password(&taken, Some("h0")).await.unwrap();
        repo.create_user_with_password(&u, Some("h1")).await.unwrap();

        u.email = taken.email.clone();
        let err = repo.update_user_and_password(&u, "h2").await.unwrap_err();
        assert!(matches!(err, AccountError::Conflict(_)));
        assert_eq!(repo.get_user_password_hash(u.id).await.unwrap().as_deref(), Some("h1"));

        u.email = "me@example.com".into();
        u.name = "Me".into();
        repo.update_user_and_password(&u, "h2").await.unwrap();
        assert_eq!(repo.get_user_by_id(u.id).await.unwrap().unwrap().name, "Me");
        assert_eq!(repo.get_user_password_hash(u.id).await.unwrap().as_deref(), Some("h2"));
    }

    #[tokio::test]
    async fn update_reindexes_changed_email() {
        let repo = InMemoryUsersRepository::new();
        let mut u = user("old@example.com");
        repo.create_user_with_password(&u, None).await.unwrap();

        u.email = "new@example.com".into();
        repo.update_user(&u).await.unwrap();

        assert!(repo.get_user_by_email("old@example.com").await.unwrap().is_none());
        assert_eq!(
            repo.get_user_by_email("new@example.com").await.unwrap().map(|u| u.id),
            Some(u.id)
        );
    }

    #[tokio::test]
    async fn updating_missing_user_is_not_found() {
        let repo = InMemoryUsersRepository::new();
        let err = repo.update_user(&user("ghost@example.com")).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    fn stored(user_id: Uuid, hash: &str) -> StoredToken {
        StoredToken {
            user_id,
            token_hash: hash.to_string(),
            sealed_token: format!("sealed-{hash}"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn second_candidate_gets_the_existing_token() {
        let repo = InMemoryAuthTokenRepository::new();
        let user_id = Uuid::now_v7();

        let first = repo.get_or_create(&stored(user_id, "first")).await.unwrap();
        let again = repo.get_or_create(&stored(user_id, "second")).await.unwrap();

        assert_eq!(first.token_hash, "first");
        assert_eq!(again, first);
        assert!(repo.find_by_hash("second").await.unwrap().is_none());
        assert_eq!(
            repo.find_by_hash("first").await.unwrap().map(|t| t.user_id),
            Some(user_id)
        );
    }

    #[tokio::test]
    async fn delete_frees_the_slot_for_a_new_token() {
        let repo = InMemoryAuthTokenRepository::new();
        let user_id = Uuid::now_v7();
        repo.get_or_create(&stored(user_id, "first")).await.unwrap();

        assert!(repo.delete_for_user(user_id).await.unwrap());
        assert!(!repo.delete_for_user(user_id).await.unwrap());
        assert!(repo.find_by_hash("first").await.unwrap().is_none());

        let next = repo.get_or_create(&stored(user_id, "second")).await.unwrap();
        assert_eq!(next.token_hash, "second");
    }
}
