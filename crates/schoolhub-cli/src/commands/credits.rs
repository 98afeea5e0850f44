//! Credit ledger commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::PageRequest;
use schoolhub_entity::credit::{
    BalanceStatus, CreditBalance, CreditTransaction, PaymentMethod, TopUpOutcome,
};
use schoolhub_service::RequestContext;

/// Arguments for the credits command
#[derive(Debug, Args)]
pub struct CreditsArgs {
    /// Credits subcommand
    #[command(subcommand)]
    pub command: CreditsCommand,
}

/// Credits subcommands
#[derive(Debug, Subcommand)]
pub enum CreditsCommand {
    /// Show a user's balance
    Balance {
        /// User id
        user: Uuid,
    },
    /// Show a user's most recent transactions
    History {
        /// User id
        user: Uuid,
        /// Number of transactions
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Grant bonus credits
    Grant {
        /// User id
        user: Uuid,
        /// Credits to grant
        amount: i64,
        /// Reason recorded on the transaction
        #[arg(long)]
        reason: String,
    },
    /// Record a payment received outside the API
    Topup {
        /// User id
        user: Uuid,
        /// Amount paid, in the configured currency
        amount: i64,
        /// Payment method
        #[arg(long, default_value = "cash")]
        method: PaymentMethod,
        /// Gateway or receipt reference, unique per payment
        #[arg(long)]
        transaction_id: String,
    },
    /// Suspend or reactivate a balance
    Status {
        /// User id
        user: Uuid,
        /// New status (active, suspended)
        status: BalanceStatus,
    },
    /// Check a balance against its transaction log
    Audit {
        /// User id
        user: Uuid,
    },
}

/// Balance display row
#[derive(Debug, Serialize, Tabled)]
struct BalanceRow {
    /// User
    user_id: String,
    /// Current
    current: i64,
    /// Bonus
    bonus: i64,
    /// Used
    used: i64,
    /// Initial
    initial: i64,
    /// Status
    status: String,
}

impl From<&CreditBalance> for BalanceRow {
    fn from(b: &CreditBalance) -> Self {
        Self {
            user_id: b.user_id.to_string(),
            current: b.current_credits,
            bonus: b.bonus_credits,
            used: b.used_credits,
            initial: b.initial_credits,
            status: b.status.to_string(),
        }
    }
}

/// Transaction display row
#[derive(Debug, Serialize, Tabled)]
struct TransactionRow {
    /// When
    at: String,
    /// Kind
    kind: String,
    /// Amount
    amount: i64,
    /// Balance after
    balance_after: i64,
    /// Reason
    reason: String,
}

impl From<&CreditTransaction> for TransactionRow {
    fn from(t: &CreditTransaction) -> Self {
        Self {
            at: t.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: t.kind.to_string(),
            amount: t.amount,
            balance_after: t.balance_after,
            reason: t.reason.clone(),
        }
    }
}

/// Execute credits commands
pub async fn execute(
    args: &CreditsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::create_services(config).await?;
    let ctx = RequestContext::system();

    match &args.command {
        CreditsCommand::Balance { user } => {
            let balance = services.credits.balance_of(*user).await?;
            output::print_item(BalanceRow::from(&balance), format);
        }
        CreditsCommand::History { user, limit } => {
            let page = services
                .credits
                .list_transactions(&ctx, Some(*user), PageRequest::new(1, *limit))
                .await?;
            let rows: Vec<TransactionRow> = page.items.iter().map(TransactionRow::from).collect();
            output::print_list(&rows, format);
        }
        CreditsCommand::Grant {
            user,
            amount,
            reason,
        } => {
            let movement = services
                .credits
                .grant_bonus(&ctx, *user, *amount, reason)
                .await?;
            output::print_success(&format!(
                "Granted {} credits, balance now {}",
                amount, movement.balance.current_credits
            ));
        }
        CreditsCommand::Topup {
            user,
            amount,
            method,
            transaction_id,
        } => match services
            .credits
            .top_up(*user, *amount, *method, transaction_id)
            .await?
        {
            TopUpOutcome::Credited { payment, movement } => {
                output::print_success(&format!(
                    "Credited {} credits, balance now {}",
                    payment.credits_awarded, movement.balance.current_credits
                ));
            }
            TopUpOutcome::Duplicate { payment } => {
                output::print_warning(&format!(
                    "Transaction '{}' was already recorded as payment {}; nothing credited",
                    payment.external_transaction_id, payment.id
                ));
            }
        },
        CreditsCommand::Status { user, status } => {
            let balance = services.credits.set_status(&ctx, *user, *status).await?;
            output::print_item(BalanceRow::from(&balance), format);
        }
        CreditsCommand::Audit { user } => {
            let audit = services.credits.audit(*user).await?;
            println!("Ledger audit for {}:", user);
            output::print_kv("Logged sum", &audit.logged_sum.to_string());
            output::print_kv("Expected sum", &audit.expected_sum.to_string());
            if audit.is_consistent() {
                output::print_success("Balance matches its transaction log");
            } else {
                output::print_warning(&format!("Drift of {} credits", audit.drift()));
            }
        }
    }

    Ok(())
}
