//! Credit ledger entities: the balance row, the append-only transaction
//! log, and top-up payments.

pub mod balance;
pub mod payment;
pub mod transaction;

pub use balance::{BalanceStatus, CreditBalance};
pub use payment::{CreditPayment, NewPayment, PaymentMethod, TopUpOutcome};
pub use transaction::{CreditTransaction, LedgerMovement, TransactionKind};
