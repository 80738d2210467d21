use std::time::Duration;

/// Env var naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "ACCOUNTS_CONFIG";

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_WAIT_INTERVAL: Duration = Duration::from_secs(1);

// Development-only secrets; the loader warns when either is in effect.
pub const DEFAULT_PASSWORD_PEPPER: &str = "accounts-dev-pepper-change-me";
pub const DEFAULT_TOKEN_KEY: &str = "accounts-dev-token-key-change-me";
