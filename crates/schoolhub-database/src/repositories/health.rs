//! Database liveness probe.

use async_trait::async_trait;
use sqlx::PgPool;

use schoolhub_core::result::AppResult;

use crate::error::db_err;
use crate::store::HealthStore;

/// Pings PostgreSQL.
#[derive(Debug, Clone)]
pub struct HealthRepository {
    pool: PgPool,
}

impl HealthRepository {
    /// Create a new health repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthStore for HealthRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Health check failed"))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
