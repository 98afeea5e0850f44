//! Document generation gate and template management.
//!
//! Generation is a small saga:
//!
//! 1. debit the template cost and insert a `pending` row (one transaction)
//! 2. render the layout and store the artifact
//! 3. mark the row `completed` and bump the template counters
//!
//! A failure in step 2 marks the row `failed` and issues a refund keyed
//! by `document:<id>`. A failed row without a refund id is the outbox the
//! reconciler drains.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::error::{AppError, ErrorKind};
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_database::store::DocumentStore;
use schoolhub_entity::document::{
    DocumentStatus, DocumentTemplate, GeneratedDocument, NewDocument, NewTemplate,
    TemplateCategory,
};
use schoolhub_entity::notification::{NewNotification, NotificationCategory, NotificationType};

use super::artifact::ArtifactStore;
use super::renderer;
use crate::context::RequestContext;
use crate::credit::CreditService;
use crate::notification::NotificationService;

/// Orchestrates templates, the credit debit and artifact storage.
#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentStore>,
    credits: CreditService,
    notifications: NotificationService,
    artifacts: Arc<dyn ArtifactStore>,
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("artifacts", &self.artifacts.provider_type())
            .finish()
    }
}

impl DocumentService {
    /// Creates a new document service.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        credits: CreditService,
        notifications: NotificationService,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            documents,
            credits,
            notifications,
            artifacts,
        }
    }

    /// Active templates, optionally by category. Admins may include
    /// inactive ones.
    pub async fn list_templates(
        &self,
        ctx: &RequestContext,
        category: Option<TemplateCategory>,
        include_inactive: bool,
    ) -> Result<Vec<DocumentTemplate>, AppError> {
        let include_inactive = include_inactive && ctx.is_admin();
        self.documents.list_templates(category, include_inactive).await
    }

    /// Create a template (admin).
    pub async fn create_template(
        &self,
        ctx: &RequestContext,
        input: NewTemplate,
    ) -> Result<DocumentTemplate, AppError> {
        ctx.require(SystemPermission::TemplateManage)?;
        validate_template(&input)?;
        let template = self.documents.create_template(&input).await?;
        info!(
            template_id = %template.id,
            name = %template.name,
            category = %template.category,
            credit_cost = template.credit_cost,
            "Template created"
        );
        Ok(template)
    }

    /// Run the generation gate for the caller.
    pub async fn generate(
        &self,
        ctx: &RequestContext,
        template_id: Uuid,
        input_data: serde_json::Value,
    ) -> Result<GeneratedDocument, AppError> {
        ctx.require(SystemPermission::DocumentGenerate)?;
        let template = self
            .documents
            .find_template(template_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| AppError::not_found(format!("Template {template_id} not found")))?;
        template.validate_input(&input_data)?;

        let (pending, _) = self
            .documents
            .begin_generation(&NewDocument {
                id: Uuid::now_v7(),
                user_id: ctx.user_id,
                template_id,
                input_data,
                credits_charged: template.credit_cost,
                reason: format!("Document generation: {}", template.name),
            })
            .await?;
        info!(
            document_id = %pending.id,
            template_id = %template_id,
            user_id = %ctx.user_id,
            credits = pending.credits_charged,
            "Document generation started"
        );

        match self.produce(&template, &pending).await {
            Ok((path, url)) => {
                let completed = self
                    .documents
                    .complete_generation(pending.id, &path, &url)
                    .await?;
                info!(document_id = %completed.id, path = %path, "Document generated");
                self.notifications
                    .notify_best_effort(NewNotification::direct(
                        ctx.user_id,
                        NotificationType::Success,
                        NotificationCategory::Document,
                        "Document ready",
                        format!("Your {} is ready to download.", template.name),
                    ))
                    .await;
                Ok(completed)
            }
            Err(err) => {
                warn!(document_id = %pending.id, error = %err, "Document generation failed");
                let refunded = match self.fail_and_refund(&pending, &err.message).await {
                    Ok(doc) => doc.refund_transaction_id.is_some() || doc.credits_charged == 0,
                    Err(refund_err) => {
                        error!(
                            document_id = %pending.id,
                            error = %refund_err,
                            "Refund deferred to reconciler"
                        );
                        false
                    }
                };
                let suffix = if refunded {
                    "credits refunded"
                } else {
                    "refund pending"
                };
                Err(AppError::new(
                    err.kind,
                    format!("Document generation failed: {}; {suffix}", err.message),
                ))
            }
        }
    }

    /// One of the caller's documents (any document for admins).
    pub async fn get_document(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<GeneratedDocument, AppError> {
        self.documents
            .find_document(document_id)
            .await?
            .filter(|d| d.user_id == ctx.user_id || ctx.is_admin())
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))
    }

    /// The caller's documents, newest first.
    pub async fn list_documents(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> Result<PageResponse<GeneratedDocument>, AppError> {
        self.documents
            .list_documents(ctx.user_id, page.normalized())
            .await
    }

    /// Mark a pending document failed and refund it.
    ///
    /// A document that already failed is only refunded.
    pub async fn fail_and_refund(
        &self,
        document: &GeneratedDocument,
        reason: &str,
    ) -> Result<GeneratedDocument, AppError> {
        let failed = match self.documents.fail_generation(document.id, reason).await {
            Ok(doc) => doc,
            Err(err) if err.kind == ErrorKind::Conflict => {
                let current = self
                    .documents
                    .find_document(document.id)
                    .await?
                    .ok_or(err)?;
                if current.status != DocumentStatus::Failed {
                    return Ok(current);
                }
                current
            }
            Err(err) => return Err(err),
        };
        self.settle_refund(&failed).await
    }

    /// Refund a failed document if it charged credits and has no refund
    /// recorded yet.
    pub async fn settle_refund(
        &self,
        document: &GeneratedDocument,
    ) -> Result<GeneratedDocument, AppError> {
        if !document.needs_refund() {
            return Ok(document.clone());
        }
        let refund = self
            .credits
            .refund(
                document.user_id,
                document.credits_charged,
                "Refund for failed document generation",
                &document.ledger_reference(),
            )
            .await?;
        let updated = self.documents.attach_refund(document.id, refund.id).await?;
        info!(
            document_id = %document.id,
            refund_transaction_id = %refund.id,
            credits = document.credits_charged,
            "Failed document refunded"
        );
        self.notifications
            .notify_best_effort(NewNotification::direct(
                document.user_id,
                NotificationType::Error,
                NotificationCategory::Document,
                "Document generation failed",
                format!(
                    "We could not generate your document. {} credits were returned.",
                    document.credits_charged
                ),
            ))
            .await;
        Ok(updated)
    }

    /// Failed documents still waiting for a refund.
    pub async fn unrefunded_failures(&self, limit: i64) -> Result<Vec<GeneratedDocument>, AppError> {
        self.documents.list_unrefunded_failures(limit).await
    }

    /// Documents pending since before `older_than`.
    pub async fn stale_pending(
        &self,
        older_than: chrono::DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<GeneratedDocument>, AppError> {
        self.documents.list_stale_pending(older_than, limit).await
    }

    async fn produce(
        &self,
        template: &DocumentTemplate,
        document: &GeneratedDocument,
    ) -> Result<(String, String), AppError> {
        let html = renderer::render(&template.layout, &document.input_data)?;
        let now = Utc::now();
        let path = format!(
            "{}/{:02}/{}/{}.html",
            now.year(),
            now.month(),
            template.category,
            document.id
        );
        let stored = self.artifacts.put(&path, html.into_bytes()).await?;
        Ok((stored.path, stored.url))
    }
}

fn validate_template(input: &NewTemplate) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if input.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }
    if input.template_type.trim().is_empty() {
        errors.push("templateType is required".to_string());
    }
    if input.credit_cost < 0 {
        errors.push("creditCost must not be negative".to_string());
    }
    if input.layout.trim().is_empty() {
        errors.push("layout is required".to_string());
    } else if let Err(e) = renderer::render(&input.layout, &serde_json::json!({})) {
        errors.push(e.message);
    }

    let mut seen = HashSet::new();
    for field in &input.fields {
        if field.name.trim().is_empty() {
            errors.push("field names must not be empty".to_string());
        } else if !seen.insert(field.name.as_str()) {
            errors.push(format!("duplicate field '{}'", field.name));
        }
    }
    for placeholder in renderer::placeholders(&input.layout) {
        if !seen.contains(placeholder.as_str()) {
            errors.push(format!("layout references unknown field '{placeholder}'"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::artifact::MemoryArtifactStore;
    use crate::notification::NotificationHub;
    use schoolhub_core::config::credits::CreditsConfig;
    use schoolhub_database::MemoryStore;
    use schoolhub_database::store::UserStore;
    use schoolhub_entity::document::{FieldType, TemplateField};
    use schoolhub_entity::user::{CreateUser, UserRole};
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        artifacts: Arc<MemoryArtifactStore>,
        credits: CreditService,
        service: DocumentService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let notifications = NotificationService::new(store.clone(), NotificationHub::new(8));
        let credits = CreditService::new(
            store.clone(),
            notifications.clone(),
            CreditsConfig::default(),
        );
        let service = DocumentService::new(
            store.clone(),
            credits.clone(),
            notifications,
            artifacts.clone(),
        );
        Fixture {
            store,
            artifacts,
            credits,
            service,
        }
    }

    fn id_card(layout: &str, cost: i64) -> NewTemplate {
        NewTemplate {
            name: "Student ID Card".into(),
            name_bn: Some("ছাত্র পরিচয়পত্র".into()),
            category: TemplateCategory::IdCard,
            template_type: "student".into(),
            fields: vec![TemplateField {
                name: "name".into(),
                label: "Name".into(),
                label_bn: None,
                field_type: FieldType::Text,
                required: true,
            }],
            layout: layout.into(),
            credit_cost: cost,
        }
    }

    async fn member(store: &MemoryStore, credits: i64) -> RequestContext {
        let (user, _) = store
            .create_user(
                &CreateUser {
                    id: None,
                    email: format!("{}@school.test", Uuid::new_v4()),
                    full_name: "Member".into(),
                    full_name_bn: None,
                    role: UserRole::Teacher,
                    school_id: None,
                },
                credits,
            )
            .await
            .unwrap();
        RequestContext::new(user.id, user.role, None)
    }

    #[tokio::test]
    async fn test_generation_debits_and_completes() {
        let f = fixture();
        let admin = RequestContext::system();
        let template = f
            .service
            .create_template(&admin, id_card("<h1>{{name}}</h1>", 5))
            .await
            .unwrap();
        let ctx = member(&f.store, 10).await;

        let doc = f
            .service
            .generate(&ctx, template.id, json!({"name": "Karim"}))
            .await
            .unwrap();

        assert_eq!(doc.status, DocumentStatus::Completed);
        assert!(doc.file_url.as_deref().unwrap().ends_with(".html"));
        assert_eq!(f.credits.balance_of(ctx.user_id).await.unwrap().current_credits, 5);
        assert_eq!(f.artifacts.len().await, 1);
        let used = f.store.find_template(template.id).await.unwrap().unwrap();
        assert_eq!(used.usage_count, 1);
        assert!(used.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_render_failure_refunds() {
        let f = fixture();
        // Stored directly: the service refuses malformed layouts.
        let template = f
            .store
            .create_template(&id_card("<h1>{{name</h1>", 5))
            .await
            .unwrap();
        let ctx = member(&f.store, 10).await;

        let err = f
            .service
            .generate(&ctx, template.id, json!({"name": "Karim"}))
            .await
            .unwrap_err();
        assert!(err.message.ends_with("credits refunded"));

        let docs = f.service.list_documents(&ctx, PageRequest::default()).await.unwrap();
        let failed = &docs.items[0];
        assert_eq!(failed.status, DocumentStatus::Failed);
        assert!(failed.refund_transaction_id.is_some());
        assert!(failed.error_message.is_some());

        let balance = f.credits.balance_of(ctx.user_id).await.unwrap();
        assert_eq!(balance.current_credits, 10);
        assert!(f.credits.audit(ctx.user_id).await.unwrap().is_consistent());
        assert!(f.artifacts.is_empty().await);
    }

    #[tokio::test]
    async fn test_insufficient_credits_leaves_nothing() {
        let f = fixture();
        let template = f
            .service
            .create_template(&RequestContext::system(), id_card("{{name}}", 15))
            .await
            .unwrap();
        let ctx = member(&f.store, 10).await;

        let err = f
            .service
            .generate(&ctx, template.id, json!({"name": "Karim"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientCredits);
        assert_eq!(f.credits.balance_of(ctx.user_id).await.unwrap().current_credits, 10);
        let docs = f.service.list_documents(&ctx, PageRequest::default()).await.unwrap();
        assert_eq!(docs.total_items, 0);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_debit() {
        let f = fixture();
        let template = f
            .service
            .create_template(&RequestContext::system(), id_card("{{name}}", 5))
            .await
            .unwrap();
        let ctx = member(&f.store, 10).await;
        let err = f
            .service
            .generate(&ctx, template.id, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(f.credits.balance_of(ctx.user_id).await.unwrap().current_credits, 10);
    }

    #[tokio::test]
    async fn test_unknown_template_is_not_found() {
        let f = fixture();
        let ctx = member(&f.store, 10).await;
        let err = f
            .service
            .generate(&ctx, Uuid::new_v4(), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_template_validation() {
        let f = fixture();
        let err = f
            .service
            .create_template(&RequestContext::system(), id_card("{{roll}}", -1))
            .await
            .unwrap_err();
        assert!(err.message.contains("creditCost"));
        assert!(err.message.contains("unknown field 'roll'"));

        let teacher = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, None);
        let err = f
            .service
            .create_template(&teacher, id_card("{{name}}", 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_other_users_documents_are_hidden() {
        let f = fixture();
        let template = f
            .service
            .create_template(&RequestContext::system(), id_card("{{name}}", 0))
            .await
            .unwrap();
        let owner = member(&f.store, 0).await;
        let doc = f
            .service
            .generate(&owner, template.id, json!({"name": "A"}))
            .await
            .unwrap();
        assert_eq!(doc.debit_transaction_id, None);

        let other = member(&f.store, 0).await;
        let err = f.service.get_document(&other, doc.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
