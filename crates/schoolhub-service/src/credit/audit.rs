//! Ledger consistency check.

use serde::Serialize;
use uuid::Uuid;

use schoolhub_entity::credit::CreditBalance;

/// Result of comparing a balance row with its transaction log.
///
/// The initial grant is not logged, so the log must sum to
/// `current_credits - initial_credits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAudit {
    /// Audited user.
    pub user_id: Uuid,
    /// Sum of all logged amounts.
    pub logged_sum: i64,
    /// What the sum should be according to the balance row.
    pub expected_sum: i64,
}

impl LedgerAudit {
    /// Build the audit for `balance` given the logged sum.
    pub fn new(balance: &CreditBalance, logged_sum: i64) -> Self {
        Self {
            user_id: balance.user_id,
            logged_sum,
            expected_sum: balance.current_credits - balance.initial_credits,
        }
    }

    /// Whether log and balance agree.
    pub fn is_consistent(&self) -> bool {
        self.logged_sum == self.expected_sum
    }

    /// Signed difference between the log and the balance.
    pub fn drift(&self) -> i64 {
        self.logged_sum - self.expected_sum
    }
}
