//! Notification fan-out configuration.

use serde::{Deserialize, Serialize};

/// Realtime hub and retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Capacity of the in-process broadcast channel.
    #[serde(default = "default_capacity")]
    pub channel_capacity: usize,
    /// Default age in days for `notifications prune`.
    #[serde(default = "default_retention")]
    pub retention_days: i64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_capacity(),
            retention_days: default_retention(),
        }
    }
}

fn default_capacity() -> usize {
    256
}

fn default_retention() -> i64 {
    90
}
