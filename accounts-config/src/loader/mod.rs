pub mod db_url;
pub mod error;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::{
    DEFAULT_DB_MAX_CONNECTIONS, DEFAULT_DB_WAIT_INTERVAL, DEFAULT_PASSWORD_PEPPER,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_TOKEN_KEY,
};
use crate::models::sources::{EnvConfig, FileConfig, parse_duration};
use crate::models::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig, DbWaitConfig,
    ServerConfig,
};
use crate::util::process_env;
use crate::validation::ConfigWarnings;

use db_url::resolve_database_url;
use error::ConfigLoadError;

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

/// Builds a [`Config`] from env, an optional TOML file and defaults.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    load_dotenv: bool,
    env: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            load_dotenv: true,
            env: None,
        }
    }

    /// Use this TOML file instead of the one named by `ACCOUNTS_CONFIG`.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Read variables from `vars` instead of the process environment.
    /// Implies no `.env` loading.
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self.load_dotenv = false;
        self
    }

    pub fn without_dotenv(mut self) -> Self {
        self.load_dotenv = false;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_dotenv && load_dotenv()?;

        let vars = match &self.env {
            Some(vars) => vars.clone(),
            None => process_env(),
        };
        let env = EnvConfig::from_map(&vars)?;

        let config_path = self.config_path.clone().or_else(|| env.config_path.clone());
        let file = match &config_path {
            Some(path) => read_file_config(path)?,
            None => FileConfig::default(),
        };

        let config = compose(env, file, ConfigMetadata {
            config_path,
            env_file_loaded,
        })?;
        let warnings = ConfigWarnings::collect(&config);

        Ok(ConfigLoad { config, warnings })
    }
}

fn load_dotenv() -> Result<bool, ConfigLoadError> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "Loaded env file");
            Ok(true)
        }
        Err(err) if err.not_found() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigLoadError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn compose(
    env: EnvConfig,
    file: FileConfig,
    metadata: ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let url = resolve_database_url(&env, &file.database)?;

    let file_wait_interval = file
        .db_wait
        .interval
        .as_deref()
        .map(|raw| parse_duration("db_wait.interval", raw))
        .transpose()?;

    Ok(Config {
        server: ServerConfig {
            host: env
                .server_host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            port: env
                .server_port
                .or(file.server.port)
                .unwrap_or(DEFAULT_SERVER_PORT),
        },
        database: DatabaseConfig {
            url,
            max_connections: env
                .db_max_connections
                .or(file.database.max_connections)
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
        },
        auth: AuthConfig {
            password_pepper: env
                .auth_password_pepper
                .or(file.auth.password_pepper)
                .unwrap_or_else(|| DEFAULT_PASSWORD_PEPPER.to_string()),
            token_key: env
                .auth_token_key
                .or(file.auth.token_key)
                .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
        },
        cors: CorsConfig {
            allowed_origins: env
                .cors_allowed_origins
                .or(file.cors.allowed_origins)
                .unwrap_or_default(),
        },
        db_wait: DbWaitConfig {
            interval: env
                .db_wait_interval
                .or(file_wait_interval)
                .unwrap_or(DEFAULT_DB_WAIT_INTERVAL),
            max_attempts: env.db_wait_max_attempts.or(file.db_wait.max_attempts),
        },
        dev_mode: env.dev_mode.or(file.dev_mode).unwrap_or(false),
        metadata,
    })
}
