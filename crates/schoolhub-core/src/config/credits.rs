//! Credit ledger configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Largest amount a single debit, grant or payment may carry.
pub const MAX_CREDIT_AMOUNT: i64 = 1_000_000_000;

/// Credit pricing and grant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsConfig {
    /// Credits granted when a user account is opened.
    #[serde(default = "default_initial_grant")]
    pub initial_grant: i64,
    /// Credits awarded per unit of paid currency.
    #[serde(default = "default_rate")]
    pub credits_per_currency_unit: i64,
    /// ISO currency code of top-up payments.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// A debit leaving fewer credits than this triggers a low-balance notice.
    #[serde(default = "default_low_balance")]
    pub low_balance_threshold: i64,
}

impl CreditsConfig {
    /// Credits awarded for a payment of `currency_amount`.
    pub fn credits_for(&self, currency_amount: i64) -> AppResult<i64> {
        currency_amount
            .checked_mul(self.credits_per_currency_unit)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "A payment of {currency_amount} {} is too large",
                    self.currency
                ))
            })
    }
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            initial_grant: default_initial_grant(),
            credits_per_currency_unit: default_rate(),
            currency: default_currency(),
            low_balance_threshold: default_low_balance(),
        }
    }
}

fn default_initial_grant() -> i64 {
    100
}

fn default_rate() -> i64 {
    1
}

fn default_currency() -> String {
    "BDT".to_string()
}

fn default_low_balance() -> i64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_credits_for_applies_rate() {
        let config = CreditsConfig {
            credits_per_currency_unit: 2,
            ..CreditsConfig::default()
        };
        assert_eq!(config.credits_for(150).unwrap(), 300);
    }

    #[test]
    fn test_credits_for_rejects_overflow() {
        let config = CreditsConfig {
            credits_per_currency_unit: 10,
            ..CreditsConfig::default()
        };
        let err = config.credits_for(i64::MAX / 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
