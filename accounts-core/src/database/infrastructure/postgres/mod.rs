pub mod repositories;

pub use repositories::{PostgresAuthTokenRepository, PostgresUsersRepository};

use async_trait::async_trait;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::{fmt, str::FromStr, time::Duration};
use tracing::info;

use crate::database::readiness::ConnectionProbe;
use crate::error::{AccountError, Result};

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
}

/// PostgreSQL adapter: owns the pool and hands out repositories over it.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl PostgresDatabase {
    /// Connect eagerly; fails if the server is not reachable.
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = Self::pool_options(max_connections)
            .connect_with(Self::build_connect_options(connection_string)?)
            .await?;

        info!(max_connections, "Database pool initialized");

        Ok(Self {
            pool,
            max_connections,
        })
    }

    /// Build a pool without opening a connection. Used by the readiness wait,
    /// which must start before the server accepts connections.
    pub fn connect_lazy(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = Self::pool_options(max_connections)
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy_with(Self::build_connect_options(connection_string)?);

        Ok(Self {
            pool,
            max_connections,
        })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            max_connections: 10,
        }
    }

    fn pool_options(max_connections: u32) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
    }

    fn build_connect_options(connection_string: &str) -> Result<PgConnectOptions> {
        PgConnectOptions::from_str(connection_string).map_err(|err| {
            AccountError::Internal(format!("invalid PostgreSQL URL: {err}"))
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.max_connections,
        }
    }

    pub fn users(&self) -> PostgresUsersRepository {
        PostgresUsersRepository::new(self.pool.clone())
    }

    pub fn auth_tokens(&self) -> PostgresAuthTokenRepository {
        PostgresAuthTokenRepository::new(self.pool.clone())
    }

    /// Apply embedded migrations.
    pub async fn initialize_schema(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|err| {
            AccountError::Internal(format!("migration failed: {err}"))
        })?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl ConnectionProbe for PostgresDatabase {
    async fn probe(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|err| AccountError::Unavailable(err.to_string()))?;
        Ok(())
    }
}
