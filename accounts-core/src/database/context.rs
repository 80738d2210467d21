use std::fmt;
use std::sync::Arc;

use crate::application::unit_of_work::AppUnitOfWork;
use crate::database::PostgresDatabase;
use crate::error::Result;

/// Bundles the Postgres adapter with the unit of work built over it, so
/// startup code can run migrations on the former and hand the latter to
/// services.
#[derive(Clone)]
pub struct DatabaseContext {
    postgres: Arc<PostgresDatabase>,
    unit_of_work: Arc<AppUnitOfWork>,
}

impl fmt::Debug for DatabaseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseContext")
            .field("postgres", &self.postgres)
            .field("unit_of_work", &self.unit_of_work)
            .finish()
    }
}

impl DatabaseContext {
    /// Establish a PostgreSQL connection and compose the unit of work.
    pub async fn connect_postgres(
        connection_string: &str,
        max_connections: u32,
    ) -> Result<Self> {
        let postgres = Arc::new(
            PostgresDatabase::new(connection_string, max_connections).await?,
        );
        Ok(Self::from_postgres(postgres))
    }

    pub fn from_postgres(postgres: Arc<PostgresDatabase>) -> Self {
        let unit_of_work =
            Arc::new(AppUnitOfWork::from_postgres(postgres.as_ref()));
        Self {
            postgres,
            unit_of_work,
        }
    }

    pub fn unit_of_work(&self) -> Arc<AppUnitOfWork> {
        Arc::clone(&self.unit_of_work)
    }

    pub fn postgres(&self) -> Arc<PostgresDatabase> {
        Arc::clone(&self.postgres)
    }
}
