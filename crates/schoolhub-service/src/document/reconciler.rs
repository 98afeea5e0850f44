//! Drains the failed-but-unrefunded outbox and expires stuck generations.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use schoolhub_core::error::AppError;

use super::service::DocumentService;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Failed documents whose refund was applied in this pass.
    pub refunded: usize,
    /// Stuck pending documents failed (and refunded) in this pass.
    pub expired: usize,
    /// Documents that still could not be settled.
    pub errors: usize,
}

/// Retries refunds and fails generations stuck in `pending`.
#[derive(Debug, Clone)]
pub struct RefundReconciler {
    documents: DocumentService,
    stale_after: Duration,
    batch_size: i64,
}

impl RefundReconciler {
    /// Create a reconciler. Pending rows older than `stale_after` are
    /// considered abandoned.
    pub fn new(documents: DocumentService, stale_after: Duration, batch_size: i64) -> Self {
        Self {
            documents,
            stale_after,
            batch_size: batch_size.max(1),
        }
    }

    /// Run one pass over both queues.
    pub async fn run_once(&self) -> Result<ReconcileReport, AppError> {
        let mut report = ReconcileReport::default();

        for document in self.documents.unrefunded_failures(self.batch_size).await? {
            match self.documents.settle_refund(&document).await {
                Ok(_) => report.refunded += 1,
                Err(e) => {
                    warn!(document_id = %document.id, error = %e, "Refund retry failed");
                    report.errors += 1;
                }
            }
        }

        let cutoff = Utc::now() - self.stale_after;
        for document in self.documents.stale_pending(cutoff, self.batch_size).await? {
            match self
                .documents
                .fail_and_refund(&document, "Generation did not finish in time")
                .await
            {
                Ok(_) => report.expired += 1,
                Err(e) => {
                    warn!(document_id = %document.id, error = %e, "Failed to expire stale document");
                    report.errors += 1;
                }
            }
        }

        if report != ReconcileReport::default() {
            info!(
                refunded = report.refunded,
                expired = report.expired,
                errors = report.errors,
                "Refund reconciliation pass finished"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::credit::CreditService;
    use crate::document::artifact::MemoryArtifactStore;
    use crate::notification::{NotificationHub, NotificationService};
    use schoolhub_core::config::credits::CreditsConfig;
    use schoolhub_database::MemoryStore;
    use schoolhub_database::store::{DocumentStore, LedgerStore, UserStore};
    use schoolhub_entity::document::{DocumentStatus, NewDocument};
    use schoolhub_entity::user::{CreateUser, UserRole};

    fn services(store: Arc<MemoryStore>) -> DocumentService {
        let notifications = NotificationService::new(store.clone(), NotificationHub::new(8));
        let credits = CreditService::new(store.clone(), notifications.clone(), CreditsConfig::default());
        DocumentService::new(
            store,
            credits,
            notifications,
            Arc::new(MemoryArtifactStore::new()),
        )
    }

    async fn pending_document(store: &MemoryStore) -> (Uuid, Uuid) {
        let (user, _) = store
            .create_user(
                &CreateUser {
                    id: None,
                    email: "crash@school.test".into(),
                    full_name: "Crash".into(),
                    full_name_bn: None,
                    role: UserRole::Student,
                    school_id: None,
                },
                10,
            )
            .await
            .unwrap();
        let (doc, _) = store
            .begin_generation(&NewDocument {
                id: Uuid::now_v7(),
                user_id: user.id,
                template_id: Uuid::now_v7(),
                input_data: json!({}),
                credits_charged: 4,
                reason: "admit card".into(),
            })
            .await
            .unwrap();
        (user.id, doc.id)
    }

    #[tokio::test]
    async fn test_stale_pending_is_failed_and_refunded() {
        let store = Arc::new(MemoryStore::new());
        let (user, doc) = pending_document(&store).await;
        store
            .set_document_created_at(doc, Utc::now() - Duration::hours(1))
            .await;

        let reconciler = RefundReconciler::new(services(store.clone()), Duration::minutes(15), 50);
        let report = reconciler.run_once().await.unwrap();
        assert_eq!(report.expired, 1);

        let settled = store.find_document(doc).await.unwrap().unwrap();
        assert_eq!(settled.status, DocumentStatus::Failed);
        assert!(settled.refund_transaction_id.is_some());
        assert_eq!(store.find_balance(user).await.unwrap().unwrap().current_credits, 10);

        assert_eq!(reconciler.run_once().await.unwrap(), ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_failed_without_refund_is_retried() {
        let store = Arc::new(MemoryStore::new());
        let (user, doc) = pending_document(&store).await;
        store.fail_generation(doc, "storage down").await.unwrap();

        let reconciler = RefundReconciler::new(services(store.clone()), Duration::minutes(15), 50);
        let report = reconciler.run_once().await.unwrap();
        assert_eq!(report.refunded, 1);
        assert_eq!(store.find_balance(user).await.unwrap().unwrap().current_credits, 10);
    }

    #[tokio::test]
    async fn test_fresh_pending_is_left_alone() {
        let store = Arc::new(MemoryStore::new());
        let (_, doc) = pending_document(&store).await;
        let reconciler = RefundReconciler::new(services(store.clone()), Duration::minutes(15), 50);
        reconciler.run_once().await.unwrap();
        let current = store.find_document(doc).await.unwrap().unwrap();
        assert_eq!(current.status, DocumentStatus::Pending);
    }
}
