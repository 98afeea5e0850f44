//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Session token verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC-SHA256 secret shared with the auth provider (`SESSION_SECRET`).
    #[serde(default)]
    pub session_secret: String,
    /// Lifetime of tokens issued by `schoolhub-cli token issue`, in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
    /// Clock skew tolerated when checking `exp`, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            token_ttl_minutes: default_token_ttl(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_token_ttl() -> i64 {
    60
}

fn default_leeway() -> u64 {
    30
}
