//! Credit ledger services.

pub mod audit;
pub mod service;

pub use audit::LedgerAudit;
pub use service::CreditService;
