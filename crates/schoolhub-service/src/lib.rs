//! # schoolhub-service
//!
//! Business logic for SchoolHub. Each service validates input, checks the
//! caller's permissions and orchestrates the stores of
//! `schoolhub-database`.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time, and [`ServiceRegistry`] wires them together.

pub mod context;
pub mod credit;
pub mod dashboard;
pub mod document;
pub mod notification;
pub mod registry;
pub mod school;
pub mod user;

pub use context::RequestContext;
pub use credit::{CreditService, LedgerAudit};
pub use dashboard::DashboardService;
pub use document::{
    ArtifactStore, DocumentService, LocalArtifactStore, MemoryArtifactStore, ReconcileReport,
    RefundReconciler,
};
pub use notification::{NotificationHub, NotificationService};
pub use registry::ServiceRegistry;
pub use school::{InventoryService, LibraryService, RosterService};
pub use user::UserService;
