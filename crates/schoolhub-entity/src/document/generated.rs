//! Generated document entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::DocumentStatus;

/// One generation request and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    /// Unique document identifier.
    pub id: Uuid,
    /// Who requested (and paid for) the document.
    pub user_id: Uuid,
    /// Template used.
    pub template_id: Uuid,
    /// Field values supplied by the requester.
    pub input_data: serde_json::Value,
    /// Lifecycle state.
    pub status: DocumentStatus,
    /// Storage key of the rendered artifact.
    pub file_path: Option<String>,
    /// Public URL of the rendered artifact.
    pub file_url: Option<String>,
    /// Credits debited for this document.
    pub credits_charged: i64,
    /// The debit that paid for it.
    pub debit_transaction_id: Option<Uuid>,
    /// The compensating refund, once issued.
    pub refund_transaction_id: Option<Uuid>,
    /// Why generation failed.
    pub error_message: Option<String>,
    /// When the request was accepted.
    pub created_at: DateTime<Utc>,
    /// When the document reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl GeneratedDocument {
    /// Ledger reference used by the debit and refund for this document.
    pub fn ledger_reference(&self) -> String {
        Self::reference_for(self.id)
    }

    /// Ledger reference for a document id.
    pub fn reference_for(id: Uuid) -> String {
        format!("document:{id}")
    }

    /// Whether this document failed and still owes its requester a refund.
    pub fn needs_refund(&self) -> bool {
        self.status == DocumentStatus::Failed
            && self.refund_transaction_id.is_none()
            && self.credits_charged > 0
    }
}

/// Input to the atomic debit-and-insert that starts a generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    /// Pre-assigned document id, so the debit can reference it.
    pub id: Uuid,
    /// Requester.
    pub user_id: Uuid,
    /// Template used.
    pub template_id: Uuid,
    /// Field values.
    pub input_data: serde_json::Value,
    /// Credits to debit; zero skips the debit.
    pub credits_charged: i64,
    /// Ledger reason for the debit.
    pub reason: String,
}

impl NewDocument {
    /// Materialize the pending row this input produces.
    pub fn into_pending(
        self,
        debit_transaction_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> GeneratedDocument {
        GeneratedDocument {
            id: self.id,
            user_id: self.user_id,
            template_id: self.template_id,
            input_data: self.input_data,
            status: DocumentStatus::Pending,
            file_path: None,
            file_url: None,
            credits_charged: self.credits_charged,
            debit_transaction_id,
            refund_transaction_id: None,
            error_message: None,
            created_at: now,
            completed_at: None,
        }
    }
}
