//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler runs inside the server process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression for the refund reconciler.
    #[serde(default = "default_refund_cron")]
    pub refund_reconcile_cron: String,
    /// Documents left `pending` longer than this are failed and refunded.
    #[serde(default = "default_stale_pending")]
    pub stale_pending_minutes: i64,
    /// Maximum documents handled per reconciler run.
    #[serde(default = "default_batch")]
    pub reconcile_batch_size: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refund_reconcile_cron: default_refund_cron(),
            stale_pending_minutes: default_stale_pending(),
            reconcile_batch_size: default_batch(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_refund_cron() -> String {
    "0 */5 * * * *".to_string()
}

fn default_stale_pending() -> i64 {
    15
}

fn default_batch() -> i64 {
    100
}
