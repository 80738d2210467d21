use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::ports::auth_tokens::{AuthTokenRepository, StoredToken};
use crate::error::{AccountError, Result};

#[derive(Debug, FromRow)]
struct TokenRow {
    user_id: Uuid,
    token_hash: String,
    sealed_token: String,
    created_at: DateTime<Utc>,
}

impl From<TokenRow> for StoredToken {
    fn from(row: TokenRow) -> Self {
        Self {
            user_id: row.user_id,
            token_hash: row.token_hash,
            sealed_token: row.sealed_token,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PostgresAuthTokenRepository {
    pool: PgPool,
}

impl PostgresAuthTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthTokenRepository for PostgresAuthTokenRepository {
    async fn get_or_create(&self, candidate: &StoredToken) -> Result<StoredToken> {
        // A concurrent login for the same user loses the insert and reads
        // the winner's row.
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (user_id, token_hash, sealed_token, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(candidate.user_id)
        .bind(&candidate.token_hash)
        .bind(&candidate.sealed_token)
        .bind(candidate.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AccountError::Internal(format!("Failed to store token: {e}")))?;

        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT user_id, token_hash, sealed_token, created_at
            FROM auth_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(candidate.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AccountError::Internal(format!("Failed to read token: {e}")))?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<StoredToken>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT user_id, token_hash, sealed_token, created_at
            FROM auth_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::Internal(format!("Failed to look up token: {e}")))?;

        Ok(row.map(StoredToken::from))
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AccountError::Internal(format!("Failed to revoke token: {e}"))
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::database::infrastructure::postgres::PostgresUsersRepository;
    use crate::database::ports::users::UsersRepository;
    use crate::domain::users::user::User;

    async fn seed_user(pool: &PgPool) -> Uuid {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        PostgresUsersRepository::new(pool.clone())
            .create_user_with_password(&user, None)
            .await
            .unwrap();
        user.id
    }

    fn candidate(user_id: Uuid, hash: &str) -> StoredToken {
        StoredToken {
            user_id,
            token_hash: hash.to_string(),
            sealed_token: format!("sealed-{hash}"),
            created_at: Utc::now(),
        }
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn existing_token_wins_over_a_new_candidate(pool: PgPool) {
        let user_id = seed_user(&pool).await;
        let repo = PostgresAuthTokenRepository::new(pool);

        let first = repo.get_or_create(&candidate(user_id, "digest-1")).await.unwrap();
        let again = repo.get_or_create(&candidate(user_id, "digest-2")).await.unwrap();

        assert_eq!(again.token_hash, first.token_hash);
        assert_eq!(again.sealed_token, "sealed-digest-1");
        assert!(repo.find_by_hash("digest-2").await.unwrap().is_none());
        let stored = repo.find_by_hash("digest-1").await.unwrap().unwrap();
        assert_eq!(stored.user_id, user_id);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn delete_reports_whether_a_token_existed(pool: PgPool) {
        let user_id = seed_user(&pool).await;
        let repo = PostgresAuthTokenRepository::new(pool);

        assert!(!repo.delete_for_user(user_id).await.unwrap());
        repo.get_or_create(&candidate(user_id, "digest")).await.unwrap();
        assert!(repo.delete_for_user(user_id).await.unwrap());
        assert!(repo.find_by_hash("digest").await.unwrap().is_none());
    }
}
