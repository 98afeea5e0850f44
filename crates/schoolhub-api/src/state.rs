//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use schoolhub_auth::jwt::JwtDecoder;
use schoolhub_core::config::AppConfig;
use schoolhub_database::store::HealthStore;
use schoolhub_service::ServiceRegistry;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Every business service
    pub services: ServiceRegistry,
    /// Session token validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Backend liveness probe
    pub health: Arc<dyn HealthStore>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.health.backend())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble the state from its parts.
    pub fn new(
        config: Arc<AppConfig>,
        services: ServiceRegistry,
        health: Arc<dyn HealthStore>,
    ) -> Self {
        Self {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            config,
            services,
            health,
            started_at: Instant::now(),
        }
    }
}
