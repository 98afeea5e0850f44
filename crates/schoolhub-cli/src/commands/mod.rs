//! CLI command definitions and dispatch.

pub mod credits;
pub mod migrate;
pub mod notifications;
pub mod seed;
pub mod token;
pub mod user;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::output::OutputFormat;
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_database::{DatabasePool, Stores};
use schoolhub_service::{LocalArtifactStore, ServiceRegistry};

/// SchoolHub: school management and credit ledger administration
#[derive(Debug, Parser)]
#[command(name = "schoolhub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (`config/{env}.toml`)
    #[arg(short, long, env = "SCHOOLHUB_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Seed reference data
    Seed(seed::SeedArgs),
    /// User management
    User(user::UserArgs),
    /// Credit ledger operations
    Credits(credits::CreditsArgs),
    /// Notification maintenance
    Notifications(notifications::NotificationsArgs),
    /// Session token tools
    Token(token::TokenArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(&self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config, self.format).await,
            Commands::Seed(args) => seed::execute(args, &config).await,
            Commands::User(args) => user::execute(args, &config, self.format).await,
            Commands::Credits(args) => credits::execute(args, &config, self.format).await,
            Commands::Notifications(args) => notifications::execute(args, &config).await,
            Commands::Token(args) => token::execute(args, &config).await,
        }
    }
}

/// Helper: load configuration for an environment
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    debug!(env, "Loading configuration");
    AppConfig::load(env)
}

/// Helper: connect to the configured database
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    config.require_database_url()?;
    debug!(
        max_connections = config.database.max_connections,
        "Connecting to database"
    );
    DatabasePool::connect(&config.database).await
}

/// Helper: wire every service over PostgreSQL
pub async fn create_services(config: &AppConfig) -> Result<ServiceRegistry, AppError> {
    let pool = create_db_pool(config).await?;
    let stores = Stores::postgres(pool.into_pool());
    let artifacts = LocalArtifactStore::from_config(&config.storage, &config.supabase).await?;
    Ok(ServiceRegistry::new(&stores, config, Arc::new(artifacts)))
}
