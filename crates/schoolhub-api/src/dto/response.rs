//! Response DTOs.

use serde::{Deserialize, Serialize};

use schoolhub_entity::credit::CreditBalance;
use schoolhub_entity::user::User;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A new account and its opened credit balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedUserResponse {
    /// The user.
    pub user: User,
    /// The credit account opened for them.
    pub balance: CreditBalance,
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Count value.
    pub count: i64,
}

/// Bulk update response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedResponse {
    /// Rows changed.
    pub updated: u64,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Store backend name.
    pub backend: String,
    /// `connected` or `unavailable`.
    pub database: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
}
