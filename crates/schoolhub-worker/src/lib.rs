//! Scheduled background jobs for SchoolHub.
//!
//! This crate provides:
//! - A job executor that dispatches a job type to its handler
//! - A cron scheduler that triggers handlers on their schedules
//! - The built-in jobs: refund reconciliation and notification pruning

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use scheduler::CronScheduler;

use std::sync::Arc;

use schoolhub_core::config::AppConfig;
use schoolhub_service::ServiceRegistry;

use jobs::{NotificationJobHandler, RefundJobHandler};

/// An executor with every built-in job registered.
pub fn default_executor(registry: &ServiceRegistry, config: &AppConfig) -> JobExecutor {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(RefundJobHandler::new(registry.reconciler())));
    executor.register(Arc::new(NotificationJobHandler::new(
        registry.notifications.clone(),
        config.notifications.retention_days,
    )));
    executor
}
