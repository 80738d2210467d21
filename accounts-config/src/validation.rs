use std::fmt;

use crate::Config;

/// Non-fatal configuration issue surfaced at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    DefaultPasswordPepper,
    DefaultTokenKey,
    WildcardCors,
    NoDatabaseUrl,
}

impl ConfigWarning {
    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ConfigWarning::DefaultPasswordPepper | ConfigWarning::DefaultTokenKey => {
                Some("set a long random value before exposing the server")
            }
            ConfigWarning::WildcardCors => Some("list explicit origins instead"),
            ConfigWarning::NoDatabaseUrl => None,
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ConfigWarning::DefaultPasswordPepper => {
                "AUTH_PASSWORD_PEPPER is using the development default"
            }
            ConfigWarning::DefaultTokenKey => {
                "AUTH_TOKEN_KEY is using the development default"
            }
            ConfigWarning::WildcardCors => {
                "CORS_ALLOWED_ORIGINS contains '*'; any origin may call the API"
            }
            ConfigWarning::NoDatabaseUrl => {
                "DATABASE_URL is not set; only --in-memory mode can start"
            }
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn collect(config: &Config) -> Self {
        let mut items = Vec::new();
        if config.auth.is_default_pepper() {
            items.push(ConfigWarning::DefaultPasswordPepper);
        }
        if config.auth.is_default_token_key() {
            items.push(ConfigWarning::DefaultTokenKey);
        }
        if config.cors.is_wildcard_included() {
            items.push(ConfigWarning::WildcardCors);
        }
        if config.database.url.is_none() {
            items.push(ConfigWarning::NoDatabaseUrl);
        }
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, warning: &ConfigWarning) -> bool {
        self.items.contains(warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}
