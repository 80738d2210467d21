use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::ports::users::UsersRepository;
use crate::{
    domain::users::user::{User, UserFilter},
    error::{AccountError, Result},
};

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            email: r.email,
            name: r.name,
            is_active: r.is_active,
            is_staff: r.is_staff,
            is_superuser: r.is_superuser,
            last_login: r.last_login,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn map_write_error(err: sqlx::Error, context: &str) -> AccountError {
    if let Some(db_err) = err.as_database_error()
        && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
    {
        return AccountError::Conflict("Email already exists".to_string());
    }
    AccountError::Internal(format!("{context}: {err}"))
}

/// PostgreSQL-backed implementation of the `UsersRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn create_user_with_password(
        &self,
        user: &User,
        password_hash: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            AccountError::Internal(format!("Failed to start transaction: {e}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, name, is_active, is_staff, is_superuser,
                last_login, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.last_login)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to create user"))?;

        if let Some(hash) = password_hash {
            sqlx::query(
                r#"
                INSERT INTO user_credentials (user_id, password_hash)
                VALUES ($1, $2)
                "#,
            )
            .bind(user.id)
            .bind(hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AccountError::Internal(format!("Failed to store password: {e}"))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AccountError::Internal(format!("Failed to commit transaction: {e}"))
        })?;

        info!(user_id = %user.id, "Created user");
        Ok(())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, is_active, is_staff, is_superuser,
                   last_login, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            AccountError::Internal(format!("Failed to get user by id: {e}"))
        })?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, is_active, is_staff, is_superuser,
                   last_login, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            AccountError::Internal(format!("Failed to get user by email: {e}"))
        })?;

        Ok(row.map(User::from))
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let pattern = filter.like_pattern();

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, is_active, is_staff, is_superuser,
                   last_login, created_at, updated_at
            FROM users
            WHERE $1::TEXT IS NULL
               OR email LIKE $1 ESCAPE '\'
               OR LOWER(name) LIKE $1 ESCAPE '\'
            ORDER BY id
            "#,
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AccountError::Internal(format!("Failed to list users: {e}"))
        })?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, name = $3, is_active = $4, is_staff = $5,
                is_superuser = $6, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .execute(self.pool())
        .await
        .map_err(|e| map_write_error(e, "Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(format!("User {}", user.id)));
        }
        Ok(())
    }

    async fn get_user_password_hash(
        &self,
        user_id: Uuid,
    ) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM user_credentials WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            AccountError::Internal(format!("Failed to get password hash: {e}"))
        })?;

        Ok(hash)
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            AccountError::Internal(format!("Failed to start transaction: {e}"))
        })?;

        let touched = sqlx::query("UPDATE users SET updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AccountError::Internal(format!("Failed to update user: {e}"))
            })?;
        if touched.rows_affected() == 0 {
            return Err(AccountError::NotFound(format!("User {user_id}")));
        }

        sqlx::query(
            r#"
            INSERT INTO user_credentials (user_id, password_hash, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET password_hash = EXCLUDED.password_hash,
                          updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AccountError::Internal(format!("Failed to store password: {e}"))
        })?;

        tx.commit().await.map_err(|e| {
            AccountError::Internal(format!("Failed to commit transaction: {e}"))
        })?;
        Ok(())
    }

    async fn update_user_and_password(
        &self,
        user: &User,
        password_hash: &str,
    ) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            AccountError::Internal(format!("Failed to start transaction: {e}"))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, name = $3, is_active = $4, is_staff = $5,
                is_superuser = $6, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to update user"))?;
        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(format!("User {}", user.id)));
        }

        sqlx::query(
            r#"
            INSERT INTO user_credentials (user_id, password_hash, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET password_hash = EXCLUDED.password_hash,
                          updated_at = NOW()
            "#,
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AccountError::Internal(format!("Failed to store password: {e}"))
        })?;

        tx.commit().await.map_err(|e| {
            AccountError::Internal(format!("Failed to commit transaction: {e}"))
        })?;
        Ok(())
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(|e| {
                AccountError::Internal(format!("Failed to record login: {e}"))
            })?;
        Ok(())
    }
}
