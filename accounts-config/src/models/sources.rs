use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::loader::error::ConfigLoadError;
use crate::util::{parse_bool, parse_csv};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(default)]
    pub db_wait: FileDbWaitConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_pepper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_key: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDbWaitConfig {
    /// Humantime string, e.g. `"500ms"` or `"2s"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    pub auth_password_pepper: Option<String>,
    pub auth_token_key: Option<String>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub db_wait_interval: Option<Duration>,
    pub db_wait_max_attempts: Option<u32>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    /// Read the known keys from `vars`. Empty values count as unset; values
    /// that are set but do not parse are errors rather than silently ignored.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigLoadError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            config_path: get(crate::constants::CONFIG_PATH_ENV).map(PathBuf::from),
            server_host: get("SERVER_HOST"),
            server_port: parse_number(vars, "SERVER_PORT")?,
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_number(vars, "DB_MAX_CONNECTIONS")?,
            auth_password_pepper: get("AUTH_PASSWORD_PEPPER"),
            auth_token_key: get("AUTH_TOKEN_KEY"),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS").map(|raw| parse_csv(&raw)),
            db_wait_interval: get("DB_WAIT_INTERVAL")
                .map(|raw| parse_duration("DB_WAIT_INTERVAL", &raw))
                .transpose()?,
            db_wait_max_attempts: parse_number(vars, "DB_WAIT_MAX_ATTEMPTS")?,
            dev_mode: get("DEV_MODE")
                .map(|raw| {
                    parse_bool(&raw).ok_or_else(|| ConfigLoadError::InvalidValue {
                        key: "DEV_MODE".into(),
                        value: raw.clone(),
                        reason: "expected a boolean".into(),
                    })
                })
                .transpose()?,
        })
    }
}

fn parse_number<T>(vars: &HashMap<String, String>, key: &str) -> Result<Option<T>, ConfigLoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|err| ConfigLoadError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: err.to_string(),
        })
}

pub(crate) fn parse_duration(key: &str, raw: &str) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|err| ConfigLoadError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: err.to_string(),
    })
}
