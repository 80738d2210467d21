use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("invalid database URL: {source}")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported database scheme '{scheme}', expected postgres or postgresql")]
    UnsupportedDatabaseScheme { scheme: String },
}
