use std::{fmt, sync::Arc};

use accounts_config::Config;
use accounts_core::{
    AuthCrypto, AuthenticationService, UserManager,
    application::unit_of_work::AppUnitOfWork,
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserManager,
    pub auth_service: Arc<AuthenticationService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the services over whichever stores `unit_of_work` carries.
    pub fn new(
        unit_of_work: &AppUnitOfWork,
        auth_crypto: Arc<AuthCrypto>,
        config: Arc<Config>,
    ) -> Self {
        let users = UserManager::new(unit_of_work.users.clone(), auth_crypto.clone());
        let auth_service = Arc::new(AuthenticationService::new(
            users.clone(),
            unit_of_work.auth_tokens.clone(),
            auth_crypto,
        ));

        Self {
            users,
            auth_service,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
