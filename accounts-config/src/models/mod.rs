pub mod sources;

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_PASSWORD_PEPPER, DEFAULT_TOKEN_KEY};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub db_wait: DbWaitConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `None` means no database is configured; only in-memory mode can run.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub password_pepper: String,
    pub token_key: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("password_pepper", &"[redacted]")
            .field("token_key", &"[redacted]")
            .finish()
    }
}

impl AuthConfig {
    pub fn is_default_pepper(&self) -> bool {
        self.password_pepper == DEFAULT_PASSWORD_PEPPER
    }

    pub fn is_default_token_key(&self) -> bool {
        self.token_key == DEFAULT_TOKEN_KEY
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Empty disables cross-origin access entirely.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*")
    }
}

/// Settings for the `db wait` readiness loop.
#[derive(Debug, Clone)]
pub struct DbWaitConfig {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
