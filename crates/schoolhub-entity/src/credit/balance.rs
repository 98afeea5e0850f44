//! Per-user credit balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Whether a balance may be debited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "balance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    /// Normal operation.
    Active,
    /// Debits are refused; credits still apply.
    Suspended,
}

impl BalanceStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for BalanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BalanceStatus {
    type Err = schoolhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(schoolhub_core::AppError::validation(format!(
                "Invalid balance status: '{s}'. Expected one of: active, suspended"
            ))),
        }
    }
}

/// One row per user in `credit_balances`.
///
/// `current_credits` never drops below zero; the database carries a
/// `CHECK` constraint and every debit is a conditional update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    /// Owner of the balance.
    pub user_id: Uuid,
    /// Spendable credits.
    pub current_credits: i64,
    /// Credits received as bonus grants (informational).
    pub bonus_credits: i64,
    /// Credits spent so far.
    pub used_credits: i64,
    /// Credits granted when the account was opened.
    pub initial_credits: i64,
    /// Whether debits are allowed.
    pub status: BalanceStatus,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
    /// When the balance last changed.
    pub updated_at: DateTime<Utc>,
}

impl CreditBalance {
    /// A freshly opened account.
    pub fn opened(user_id: Uuid, initial_grant: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            current_credits: initial_grant,
            bonus_credits: 0,
            used_credits: 0,
            initial_credits: initial_grant,
            status: BalanceStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `amount` credits could be debited right now.
    pub fn can_afford(&self, amount: i64) -> bool {
        self.status == BalanceStatus::Active && self.current_credits >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_afford() {
        let mut balance = CreditBalance::opened(Uuid::new_v4(), 10);
        assert!(balance.can_afford(10));
        assert!(!balance.can_afford(11));

        balance.status = BalanceStatus::Suspended;
        assert!(!balance.can_afford(1));
    }
}
