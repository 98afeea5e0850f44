//! Cron scheduler for periodic background tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use schoolhub_core::config::worker::WorkerConfig;
use schoolhub_core::error::AppError;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::jobs::notification::NOTIFICATION_CLEANUP;
use crate::jobs::refund::REFUND_RECONCILE;

/// Notification pruning runs daily at 2 AM.
const NOTIFICATION_CLEANUP_CRON: &str = "0 0 2 * * *";

/// Cron-based scheduler that triggers registered job handlers
#[derive(Clone)]
pub struct CronScheduler {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("jobs", &self.executor.registered_types())
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(executor: Arc<JobExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register all default scheduled tasks
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register(REFUND_RECONCILE, &config.refund_reconcile_cron)
            .await?;
        self.register(NOTIFICATION_CLEANUP, NOTIFICATION_CLEANUP_CRON)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run `job_type` on the six-field cron `schedule`
    pub async fn register(&self, job_type: &str, schedule: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::configuration(format!(
                "No handler registered for scheduled job '{}'",
                job_type
            )));
        }

        let executor = Arc::clone(&self.executor);
        let name = job_type.to_string();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let name = name.clone();
            Box::pin(async move {
                match executor.execute(&name).await {
                    Ok(summary) => tracing::debug!(job = %name, %summary, "Scheduled job finished"),
                    Err(JobExecutionError::Transient(e)) => {
                        tracing::warn!(job = %name, error = %e, "Scheduled job failed, will retry on next tick")
                    }
                    Err(e) => tracing::error!(job = %name, error = %e, "Scheduled job failed"),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid schedule '{}' for {}: {}",
                schedule, job_type, e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add {} schedule: {}", job_type, e))
        })?;

        tracing::info!("Registered: {} ({})", job_type, schedule);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_core::error::ErrorKind;

    #[tokio::test]
    async fn test_unknown_job_is_rejected() {
        let scheduler = CronScheduler::new(Arc::new(JobExecutor::new())).await.unwrap();
        let err = scheduler
            .register(REFUND_RECONCILE, "0 */5 * * * *")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
