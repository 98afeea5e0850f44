//! Database migration runner.
//!
//! One forward-only, checksum-tracked migration set lives in the
//! workspace `migrations/` directory and is embedded at compile time.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use schoolhub_core::error::{AppError, ErrorKind};

use crate::error::db_err;

/// The embedded migration set.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applied state of one migration.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Version number (file prefix).
    pub version: i64,
    /// Description (file name after the version).
    pub description: String,
    /// When it was applied, if it was.
    pub installed_on: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    /// Whether the migration has been applied.
    pub fn is_applied(&self) -> bool {
        self.installed_on.is_some()
    }
}

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running database migrations...");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::UpstreamService,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// List every embedded migration with its applied state.
pub async fn migration_status(pool: &PgPool) -> Result<Vec<MigrationStatus>, AppError> {
    let tracked: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await
            .map_err(db_err("Failed to inspect migration table"))?;

    let applied: Vec<(i64, DateTime<Utc>)> = if tracked {
        sqlx::query_as("SELECT version, installed_on FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await
            .map_err(db_err("Failed to read applied migrations"))?
    } else {
        Vec::new()
    };

    Ok(MIGRATOR
        .iter()
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            installed_on: applied
                .iter()
                .find(|(v, _)| *v == m.version)
                .map(|(_, at)| *at),
        })
        .collect())
}
