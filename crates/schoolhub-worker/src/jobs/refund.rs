//! Refund reconciliation job.

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use schoolhub_service::RefundReconciler;

use crate::executor::{JobExecutionError, JobHandler};

/// Job type name for refund reconciliation.
pub const REFUND_RECONCILE: &str = "refund_reconcile";

/// Settles refunds that a failed generation could not apply inline and
/// fails generations stuck in `pending`.
#[derive(Debug)]
pub struct RefundJobHandler {
    reconciler: RefundReconciler,
}

impl RefundJobHandler {
    /// Create a new refund job handler
    pub fn new(reconciler: RefundReconciler) -> Self {
        Self { reconciler }
    }
}

#[async_trait]
impl JobHandler for RefundJobHandler {
    fn job_type(&self) -> &str {
        REFUND_RECONCILE
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let report = self.reconciler.run_once().await?;

        if report.refunded + report.expired + report.errors > 0 {
            tracing::info!(
                refunded = report.refunded,
                expired = report.expired,
                errors = report.errors,
                "Refund reconciliation finished"
            );
        }

        Ok(serde_json::json!({
            "task": REFUND_RECONCILE,
            "refunded": report.refunded,
            "expired": report.expired,
            "errors": report.errors,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use schoolhub_core::config::AppConfig;
    use schoolhub_database::store::{DocumentStore, LedgerStore};
    use schoolhub_database::{MemoryStore, Stores};
    use schoolhub_entity::document::NewDocument;
    use schoolhub_service::{MemoryArtifactStore, ServiceRegistry};

    #[tokio::test]
    async fn test_refunds_stranded_failure_once() {
        let store = Arc::new(MemoryStore::new());
        let registry = ServiceRegistry::new(
            &Stores::from_memory(store.clone()),
            &AppConfig::default(),
            Arc::new(MemoryArtifactStore::new()),
        );
        let user = Uuid::now_v7();
        store.open_account(user, 20).await.unwrap();
        let (pending, _) = store
            .begin_generation(&NewDocument {
                id: Uuid::now_v7(),
                user_id: user,
                template_id: Uuid::now_v7(),
                input_data: serde_json::json!({}),
                credits_charged: 5,
                reason: "testimonial".into(),
            })
            .await
            .unwrap();
        store.fail_generation(pending.id, "renderer crashed").await.unwrap();
        assert_eq!(store.find_balance(user).await.unwrap().unwrap().current_credits, 15);

        let handler = RefundJobHandler::new(registry.reconciler());
        let summary = handler.execute().await.unwrap();
        assert_eq!(summary["refunded"], 1);
        assert_eq!(store.find_balance(user).await.unwrap().unwrap().current_credits, 20);

        let again = handler.execute().await.unwrap();
        assert_eq!(again["refunded"], 0);
    }
}
