use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accounts_config::{Config, ConfigLoad, ConfigLoader};
use accounts_core::{
    AuthCrypto,
    application::unit_of_work::AppUnitOfWork,
    database::{
        PostgresDatabase,
        context::DatabaseContext,
        readiness::WaitForDatabase,
    },
};

use crate::infra::app_state::AppState;

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load configuration and report its warnings through tracing.
pub fn load_config(loader: ConfigLoader) -> Result<Config> {
    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "loaded config file");
    }
    for warning in warnings.iter() {
        match warning.hint() {
            Some(hint) => warn!(message = %warning, hint = %hint, "configuration warning"),
            None => warn!(message = %warning, "configuration warning"),
        }
    }

    Ok(config)
}

pub fn required_database_url(config: &Config) -> Result<&str> {
    config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL is not set (use --in-memory to run without a database)")
}

/// Block until the configured database answers a probe.
pub async fn wait_for_database(config: &Config, wait: &WaitForDatabase) -> Result<u32> {
    let url = required_database_url(config)?;
    let probe = PostgresDatabase::connect_lazy(url, 1)
        .context("failed to build PostgreSQL pool for readiness probe")?;
    let attempts = wait.run(&probe).await.context("database did not become ready")?;
    Ok(attempts)
}

/// Connect, migrate, and compose the persistent unit of work.
pub async fn connect_database(config: &Config) -> Result<AppUnitOfWork> {
    let url = required_database_url(config)?;
    wait_for_database(
        config,
        &WaitForDatabase::new(config.db_wait.interval, config.db_wait.max_attempts),
    )
    .await?;

    let context = DatabaseContext::connect_postgres(url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    let postgres = context.postgres();
    postgres
        .initialize_schema()
        .await
        .context("database migration failed")?;

    let stats = postgres.pool_stats();
    info!(
        size = stats.size,
        idle = stats.idle,
        max = stats.max_size,
        "Database ready"
    );

    Ok(context.unit_of_work().as_ref().clone())
}

pub fn build_crypto(config: &Config) -> Result<Arc<AuthCrypto>> {
    let crypto = AuthCrypto::new(&config.auth.password_pepper, &config.auth.token_key)
        .context("invalid authentication secrets")?;
    Ok(Arc::new(crypto))
}

/// Build the application state over PostgreSQL, or over process-local stores
/// when `in_memory` is set.
pub async fn build_state(config: Config, in_memory: bool) -> Result<AppState> {
    let unit_of_work = if in_memory {
        warn!("Running with in-memory stores; all data is lost on exit");
        AppUnitOfWork::in_memory()
    } else {
        connect_database(&config).await?
    };

    let crypto = build_crypto(&config)?;
    Ok(AppState::new(&unit_of_work, crypto, Arc::new(config)))
}
