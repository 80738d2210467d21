use url::Url;

use crate::{ConfigLoadError, models::sources::{EnvConfig, FileDatabaseConfig}};

/// Pick the database URL (env over file) and check that it is a PostgreSQL
/// URL. Blank values count as unset.
pub fn resolve_database_url(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    let candidate = env
        .database_url
        .clone()
        .or_else(|| file_database.url.clone())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let Some(raw) = candidate else {
        return Ok(None);
    };

    let parsed = Url::parse(&raw)
        .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    match parsed.scheme() {
        "postgres" | "postgresql" => Ok(Some(raw)),
        other => Err(ConfigLoadError::UnsupportedDatabaseScheme {
            scheme: other.to_string(),
        }),
    }
}
