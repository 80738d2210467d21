use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::infrastructure::memory::{
    InMemoryAuthTokenRepository, InMemoryUsersRepository,
};
#[cfg(feature = "database")]
use crate::database::PostgresDatabase;
use crate::database::ports::{
    auth_tokens::AuthTokenRepository, users::UsersRepository,
};

/// Repository ports used by the application services.
///
/// Services depend on the trait objects only, so the same wiring runs
/// against PostgreSQL in production and the in-memory stores in tests.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub users: Arc<dyn UsersRepository>,
    pub auth_tokens: Arc<dyn AuthTokenRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("auth_tokens", &type_name_of_val(self.auth_tokens.as_ref()))
            .finish()
    }
}

impl AppUnitOfWork {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        auth_tokens: Arc<dyn AuthTokenRepository>,
    ) -> Self {
        Self { users, auth_tokens }
    }

    /// Fresh, empty process-local stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryUsersRepository::new()),
            Arc::new(InMemoryAuthTokenRepository::new()),
        )
    }

    #[cfg(feature = "database")]
    pub fn from_postgres(postgres: &PostgresDatabase) -> Self {
        Self::new(Arc::new(postgres.users()), Arc::new(postgres.auth_tokens()))
    }
}
