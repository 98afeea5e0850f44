//! Document generation.

pub mod artifact;
pub mod reconciler;
pub mod renderer;
pub mod service;

pub use artifact::{ArtifactStore, LocalArtifactStore, MemoryArtifactStore, StoredArtifact};
pub use reconciler::{ReconcileReport, RefundReconciler};
pub use service::DocumentService;
