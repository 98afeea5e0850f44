//! Notification retention job.

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use schoolhub_service::NotificationService;

use crate::executor::{JobExecutionError, JobHandler};

/// Job type name for notification pruning.
pub const NOTIFICATION_CLEANUP: &str = "notification_cleanup";

/// Deletes notifications older than the retention window
#[derive(Debug)]
pub struct NotificationJobHandler {
    notifications: NotificationService,
    retention_days: i64,
}

impl NotificationJobHandler {
    /// Create a new notification job handler
    pub fn new(notifications: NotificationService, retention_days: i64) -> Self {
        Self {
            notifications,
            retention_days,
        }
    }
}

#[async_trait]
impl JobHandler for NotificationJobHandler {
    fn job_type(&self) -> &str {
        NOTIFICATION_CLEANUP
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        tracing::info!(
            "Running notification cleanup (older than {} days)",
            self.retention_days
        );
        let removed = self.notifications.prune(self.retention_days).await?;
        tracing::info!("Notification cleanup: removed {}", removed);

        Ok(serde_json::json!({
            "task": NOTIFICATION_CLEANUP,
            "removed": removed,
            "cutoff_days": self.retention_days,
        }))
    }
}
