//! Top-up payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::transaction::LedgerMovement;

/// How a top-up was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// bKash mobile wallet.
    Bkash,
    /// Nagad mobile wallet.
    Nagad,
    /// Rocket mobile wallet.
    Rocket,
    /// Debit or credit card.
    Card,
    /// Bank transfer.
    BankTransfer,
    /// Cash at the school office.
    Cash,
}

impl PaymentMethod {
    /// Return the method as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bkash => "bkash",
            Self::Nagad => "nagad",
            Self::Rocket => "rocket",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Cash => "cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = schoolhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "bkash" => Ok(Self::Bkash),
            "nagad" => Ok(Self::Nagad),
            "rocket" => Ok(Self::Rocket),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cash" => Ok(Self::Cash),
            _ => Err(schoolhub_core::AppError::validation(format!(
                "Invalid payment method: '{s}'. Expected one of: bkash, nagad, rocket, card, bank_transfer, cash"
            ))),
        }
    }
}

/// A row in `credit_payments`. `external_transaction_id` is unique, which
/// makes top-ups idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CreditPayment {
    /// Unique payment identifier.
    pub id: Uuid,
    /// Whose balance was topped up.
    pub user_id: Uuid,
    /// Paid amount in currency units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Payment channel.
    pub method: PaymentMethod,
    /// Provider-side transaction id.
    pub external_transaction_id: String,
    /// Credits the payment bought.
    pub credits_awarded: i64,
    /// The ledger transaction that applied the credits.
    pub transaction_id: Option<Uuid>,
    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input to a top-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    /// Whose balance to top up.
    pub user_id: Uuid,
    /// Paid amount in currency units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Payment channel.
    pub method: PaymentMethod,
    /// Provider-side transaction id.
    pub external_transaction_id: String,
    /// Credits to award.
    pub credits: i64,
}

impl NewPayment {
    /// Whether `recorded` is this same payment submitted earlier.
    pub fn is_replay_of(&self, recorded: &CreditPayment) -> bool {
        recorded.external_transaction_id == self.external_transaction_id
            && recorded.user_id == self.user_id
            && recorded.amount == self.amount
            && recorded.method == self.method
    }

    /// Outcome for a payment whose transaction id is already recorded.
    ///
    /// Only an exact replay is a duplicate. Reusing the id for another
    /// user, amount or method is a conflict.
    pub fn replay(&self, recorded: CreditPayment) -> schoolhub_core::AppResult<TopUpOutcome> {
        if self.is_replay_of(&recorded) {
            Ok(TopUpOutcome::Duplicate { payment: recorded })
        } else {
            Err(schoolhub_core::AppError::conflict(format!(
                "Transaction id '{}' was already used for a different payment",
                self.external_transaction_id
            )))
        }
    }
}

/// Result of a top-up attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TopUpOutcome {
    /// The payment was new and the credits were applied.
    Credited {
        /// The recorded payment.
        payment: CreditPayment,
        /// The ledger write.
        movement: LedgerMovement,
    },
    /// The external transaction id was already recorded; nothing changed.
    Duplicate {
        /// The originally recorded payment.
        payment: CreditPayment,
    },
}

impl TopUpOutcome {
    /// The payment row, new or original.
    pub fn payment(&self) -> &CreditPayment {
        match self {
            Self::Credited { payment, .. } | Self::Duplicate { payment } => payment,
        }
    }

    /// Whether this attempt replayed an earlier payment.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}
