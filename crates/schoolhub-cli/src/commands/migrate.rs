//! Database migration management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_database::migration;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show migration status
    Status,
}

/// Migration display row
#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    /// Version
    version: i64,
    /// Description
    description: String,
    /// Applied timestamp or "pending"
    applied: String,
}

/// Execute migration commands
pub async fn execute(
    args: &MigrateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            migration::run_migrations(pool.pool()).await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Status => {
            let status = migration::migration_status(pool.pool()).await?;
            let pending = status.iter().filter(|m| !m.is_applied()).count();
            let rows: Vec<MigrationRow> = status
                .into_iter()
                .map(|m| MigrationRow {
                    version: m.version,
                    applied: m
                        .installed_on
                        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "pending".to_string()),
                    description: m.description,
                })
                .collect();
            output::print_list(&rows, format);
            if pending > 0 {
                output::print_warning(&format!("{} migration(s) pending", pending));
            }
        }
    }

    pool.close().await;
    Ok(())
}
