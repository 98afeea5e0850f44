//! Append-only credit movements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::balance::CreditBalance;

/// Kind of credit movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credit_transaction_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credits spent (negative amount).
    Debit,
    /// Credits bought with a payment.
    TopUp,
    /// Credits granted by an admin.
    Bonus,
    /// Compensating credit for a failed action.
    Refund,
}

impl TransactionKind {
    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::TopUp => "top_up",
            Self::Bonus => "bonus",
            Self::Refund => "refund",
        }
    }

    /// Whether movements of this kind carry a negative amount.
    pub fn is_outgoing(&self) -> bool {
        matches!(self, Self::Debit)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row in `credit_transactions`. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    /// Unique transaction identifier.
    pub id: Uuid,
    /// Whose balance moved.
    pub user_id: Uuid,
    /// Signed movement; negative for debits.
    pub amount: i64,
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Free-text reason.
    pub reason: String,
    /// External payment id or `document:<id>`.
    pub reference: Option<String>,
    /// `current_credits` right after this movement.
    pub balance_after: i64,
    /// When the movement was recorded.
    pub created_at: DateTime<Utc>,
}

/// A ledger write: the logged movement and the balance it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMovement {
    /// The appended transaction.
    pub transaction: CreditTransaction,
    /// The balance after the movement.
    pub balance: CreditBalance,
}
