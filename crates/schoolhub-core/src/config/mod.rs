//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate.
//! Sources are layered in this order, later ones winning:
//!
//! 1. `config/default.toml`
//! 2. `config/{env}.toml`
//! 3. `SCHOOLHUB__SECTION__KEY` environment variables
//! 4. the well-known deployment variables (`DATABASE_URL`, `SESSION_SECRET`,
//!    `SUPABASE_*`, with `VITE_SUPABASE_*` accepted as fallbacks)

pub mod app;
pub mod auth;
pub mod credits;
pub mod database;
pub mod logging;
pub mod notifications;
pub mod storage;
pub mod supabase;
pub mod worker;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::credits::CreditsConfig;
use self::database::DatabaseConfig;
use self::logging::LoggingConfig;
use self::notifications::NotificationsConfig;
use self::storage::StorageConfig;
use self::supabase::SupabaseConfig;
use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Managed Postgres provider settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,
    /// Artifact storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Credit ledger settings.
    #[serde(default)]
    pub credits: CreditsConfig,
    /// Notification hub settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment name from the config
    /// files and the process environment, then validate it.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(env, vars)
    }

    /// Load configuration using `vars` in place of the process environment.
    pub fn load_from(env: &str, vars: HashMap<String, String>) -> Result<Self, AppError> {
        let lookup = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SCHOOLHUB")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )
            .set_override_option("database.url", lookup("DATABASE_URL"))?
            .set_override_option("auth.session_secret", lookup("SESSION_SECRET"))?
            .set_override_option(
                "supabase.url",
                lookup("SUPABASE_URL").or_else(|| lookup("VITE_SUPABASE_URL")),
            )?
            .set_override_option(
                "supabase.anon_key",
                lookup("SUPABASE_ANON_KEY").or_else(|| lookup("VITE_SUPABASE_ANON_KEY")),
            )?
            .set_override_option("supabase.service_key", lookup("SUPABASE_SERVICE_KEY"))?;

        let config = builder
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        app.validate()?;
        Ok(app)
    }

    /// Check values that deserialization alone cannot enforce.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.session_secret.trim().is_empty() {
            return Err(AppError::configuration("SESSION_SECRET is required"));
        }
        if self.credits.credits_per_currency_unit <= 0 {
            return Err(AppError::configuration(
                "credits.credits_per_currency_unit must be positive",
            ));
        }
        if self.credits.initial_grant < 0 {
            return Err(AppError::configuration(
                "credits.initial_grant must not be negative",
            ));
        }
        if self.notifications.channel_capacity == 0 {
            return Err(AppError::configuration(
                "notifications.channel_capacity must be positive",
            ));
        }
        if self.worker.stale_pending_minutes <= 0 {
            return Err(AppError::configuration(
                "worker.stale_pending_minutes must be positive",
            ));
        }
        Ok(())
    }

    /// Fail unless a database URL is configured.
    pub fn require_database_url(&self) -> Result<&str, AppError> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("DATABASE_URL is required"));
        }
        Ok(&self.database.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_well_known_variables_are_mapped() {
        let cfg = AppConfig::load_from(
            "test-none",
            vars(&[
                ("DATABASE_URL", "postgres://u:p@localhost/school"),
                ("SESSION_SECRET", "s3cret"),
                ("VITE_SUPABASE_URL", "https://vite.supabase.co"),
                ("SUPABASE_ANON_KEY", "anon"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.database.url, "postgres://u:p@localhost/school");
        assert_eq!(cfg.auth.session_secret, "s3cret");
        assert_eq!(cfg.supabase.url.as_deref(), Some("https://vite.supabase.co"));
        assert_eq!(cfg.supabase.anon_key.as_deref(), Some("anon"));
        assert_eq!(cfg.credits.currency, "BDT");
        assert_eq!(cfg.credits.credits_per_currency_unit, 1);
    }

    #[test]
    fn test_primary_supabase_url_wins_over_vite() {
        let cfg = AppConfig::load_from(
            "test-none",
            vars(&[
                ("SESSION_SECRET", "s3cret"),
                ("SUPABASE_URL", "https://primary.supabase.co"),
                ("VITE_SUPABASE_URL", "https://vite.supabase.co"),
            ]),
        )
        .unwrap();
        assert_eq!(
            cfg.supabase.url.as_deref(),
            Some("https://primary.supabase.co")
        );
    }

    #[test]
    fn test_prefixed_override() {
        let cfg = AppConfig::load_from(
            "test-none",
            vars(&[
                ("SESSION_SECRET", "s3cret"),
                ("SCHOOLHUB__CREDITS__INITIAL_GRANT", "25"),
                ("SCHOOLHUB__SERVER__PORT", "9090"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.credits.initial_grant, 25);
        assert_eq!(cfg.server.port, 9090);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let err = AppConfig::load_from("test-none", HashMap::new()).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_require_database_url() {
        let cfg = AppConfig::default();
        assert!(cfg.require_database_url().is_err());
    }
}
