//! # Accounts Server
//!
//! Runs the HTTP API (default) or one of the maintenance commands:
//!
//! - `db wait` blocks until PostgreSQL accepts queries
//! - `db migrate` applies the embedded migrations
//! - `create-superuser` creates a staff account with full privileges

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;

use accounts_config::{Config, ConfigLoader};
use accounts_core::{
    application::unit_of_work::AppUnitOfWork,
    database::{PostgresDatabase, readiness::WaitForDatabase},
    domain::users::{user::ExtraFields, validation::MIN_PASSWORD_CHARS},
};
use accounts_server::{
    AppState,
    infra::startup::{
        build_crypto, build_state, connect_database, init_tracing, load_config,
        required_database_url, wait_for_database,
    },
    routes::create_app,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "accounts-server")]
#[command(about = "User accounts API: registration, token login and profiles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// TOML config file (overrides ACCOUNTS_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use process-local stores instead of PostgreSQL
    #[arg(long, env = "ACCOUNTS_IN_MEMORY", default_value_t = false)]
    in_memory: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
    /// Create an account with staff and superuser rights
    CreateSuperuser(CreateSuperuserArgs),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Wait until the database accepts queries, then exit
    Wait(WaitArgs),
    /// Apply database migrations and exit
    Migrate,
}

#[derive(ClapArgs, Debug)]
struct WaitArgs {
    /// Pause between attempts, e.g. `1s` or `500ms` (overrides DB_WAIT_INTERVAL)
    #[arg(long, value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Give up after this many attempts (overrides DB_WAIT_MAX_ATTEMPTS)
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[derive(ClapArgs, Debug)]
struct CreateSuperuserArgs {
    #[arg(long)]
    email: String,

    /// Prompted for when omitted
    #[arg(long, env = "ACCOUNTS_SUPERUSER_PASSWORD")]
    password: Option<String>,

    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = load_runtime_config(&cli.serve)?;

    match cli.command {
        Some(Command::Db(DbCommand::Wait(args))) => run_db_wait(&config, args).await,
        Some(Command::Db(DbCommand::Migrate)) => run_db_migrate(&config).await,
        Some(Command::CreateSuperuser(args)) => run_create_superuser(&config, args).await,
        None => run_server(config, cli.serve.in_memory).await,
    }
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.clone() {
        loader = loader.with_config_path(path);
    }
    let mut config = load_config(loader)?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }
    Ok(config)
}

async fn run_db_wait(config: &Config, args: WaitArgs) -> anyhow::Result<()> {
    let wait = WaitForDatabase::new(
        args.interval.unwrap_or(config.db_wait.interval),
        args.max_attempts.or(config.db_wait.max_attempts),
    );
    let attempts = wait_for_database(config, &wait).await?;
    info!(attempts, "Database is accepting connections");
    Ok(())
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    let url = required_database_url(config)?;
    let pg = PostgresDatabase::new(url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL for migration")?;
    pg.initialize_schema()
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_create_superuser(
    config: &Config,
    args: CreateSuperuserArgs,
) -> anyhow::Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .with_confirmation("Password (again)", "Passwords do not match")
            .interact()
            .context("failed to read password")?,
    };
    if password.chars().count() < MIN_PASSWORD_CHARS {
        bail!("password must be at least {MIN_PASSWORD_CHARS} characters");
    }

    let unit_of_work: AppUnitOfWork = connect_database(config).await?;
    let state = AppState::new(&unit_of_work, build_crypto(config)?, config.clone().into());

    let extra = ExtraFields {
        name: args.name,
        ..ExtraFields::default()
    };
    let user = state
        .users
        .create_superuser(&args.email, Some(&password), extra)
        .await
        .context("failed to create superuser")?;

    info!(user_id = %user.id, email = %user.email, "Superuser created successfully");
    Ok(())
}

async fn run_server(config: Config, in_memory: bool) -> anyhow::Result<()> {
    let bind_address = config.server.bind_address();
    let state = build_state(config, in_memory).await?;
    let router = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!("Starting accounts server on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
