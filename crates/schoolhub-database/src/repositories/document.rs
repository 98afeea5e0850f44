//! Document template and generated document repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::credit::LedgerMovement;
use schoolhub_entity::document::{
    DocumentTemplate, GeneratedDocument, NewDocument, NewTemplate, TemplateCategory,
};

use super::ledger::debit_in;
use crate::error::db_err;
use crate::store::DocumentStore;

/// Repository for `document_templates` and `generated_documents`.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Explain why a guarded status update matched no row.
async fn transition_error(conn: &mut PgConnection, id: Uuid, target: &str) -> AppError {
    let current = sqlx::query_as::<_, GeneratedDocument>(
        "SELECT * FROM generated_documents WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await;
    match current {
        Ok(None) => AppError::not_found(format!("Document {id} not found")),
        Ok(Some(doc)) => AppError::conflict(format!(
            "Document {id} cannot move from {} to {target}",
            doc.status
        )),
        Err(e) => crate::error::classify(e, "Failed to load document"),
    }
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn create_template(&self, input: &NewTemplate) -> AppResult<DocumentTemplate> {
        sqlx::query_as::<_, DocumentTemplate>(
            "INSERT INTO document_templates \
             (id, name, name_bn, category, template_type, fields, layout, credit_cost) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.name_bn)
        .bind(input.category)
        .bind(&input.template_type)
        .bind(Json(&input.fields))
        .bind(&input.layout)
        .bind(input.credit_cost)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create template"))
    }

    async fn find_template(&self, id: Uuid) -> AppResult<Option<DocumentTemplate>> {
        sqlx::query_as::<_, DocumentTemplate>("SELECT * FROM document_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find template"))
    }

    async fn list_templates(
        &self,
        category: Option<TemplateCategory>,
        include_inactive: bool,
    ) -> AppResult<Vec<DocumentTemplate>> {
        sqlx::query_as::<_, DocumentTemplate>(
            "SELECT * FROM document_templates \
             WHERE ($1::template_category IS NULL OR category = $1) AND ($2 OR is_active) \
             ORDER BY name",
        )
        .bind(category)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list templates"))
    }

    async fn begin_generation(
        &self,
        input: &NewDocument,
    ) -> AppResult<(GeneratedDocument, Option<LedgerMovement>)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin generation"))?;

        let movement = if input.credits_charged > 0 {
            let reference = GeneratedDocument::reference_for(input.id);
            Some(
                debit_in(
                    &mut tx,
                    input.user_id,
                    input.credits_charged,
                    &input.reason,
                    Some(&reference),
                )
                .await?,
            )
        } else {
            None
        };

        let document = sqlx::query_as::<_, GeneratedDocument>(
            "INSERT INTO generated_documents \
             (id, user_id, template_id, input_data, status, credits_charged, debit_transaction_id) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $6) RETURNING *",
        )
        .bind(input.id)
        .bind(input.user_id)
        .bind(input.template_id)
        .bind(&input.input_data)
        .bind(input.credits_charged)
        .bind(movement.as_ref().map(|m| m.transaction.id))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to create pending document"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit generation start"))?;
        Ok((document, movement))
    }

    async fn complete_generation(
        &self,
        id: Uuid,
        file_path: &str,
        file_url: &str,
    ) -> AppResult<GeneratedDocument> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin completion"))?;

        let completed = sqlx::query_as::<_, GeneratedDocument>(
            "UPDATE generated_documents \
             SET status = 'completed', file_path = $2, file_url = $3, completed_at = NOW() \
             WHERE id = $1 AND status = 'pending' RETURNING *",
        )
        .bind(id)
        .bind(file_path)
        .bind(file_url)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to complete document"))?;

        let Some(document) = completed else {
            return Err(transition_error(&mut tx, id, "completed").await);
        };

        sqlx::query(
            "UPDATE document_templates \
             SET usage_count = usage_count + 1, last_used_at = NOW() WHERE id = $1",
        )
        .bind(document.template_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to bump template usage"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit completion"))?;
        Ok(document)
    }

    async fn fail_generation(&self, id: Uuid, error: &str) -> AppResult<GeneratedDocument> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_err("Failed to acquire connection"))?;

        let failed = sqlx::query_as::<_, GeneratedDocument>(
            "UPDATE generated_documents \
             SET status = 'failed', error_message = $2, completed_at = NOW() \
             WHERE id = $1 AND status = 'pending' RETURNING *",
        )
        .bind(id)
        .bind(error)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("Failed to mark document failed"))?;

        match failed {
            Some(document) => Ok(document),
            None => Err(transition_error(&mut conn, id, "failed").await),
        }
    }

    async fn attach_refund(
        &self,
        id: Uuid,
        refund_transaction_id: Uuid,
    ) -> AppResult<GeneratedDocument> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_err("Failed to acquire connection"))?;

        let updated = sqlx::query_as::<_, GeneratedDocument>(
            "UPDATE generated_documents \
             SET refund_transaction_id = COALESCE(refund_transaction_id, $2) \
             WHERE id = $1 AND status = 'failed' RETURNING *",
        )
        .bind(id)
        .bind(refund_transaction_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("Failed to record refund on document"))?;

        match updated {
            Some(document) => Ok(document),
            None => Err(transition_error(&mut conn, id, "refunded").await),
        }
    }

    async fn find_document(&self, id: Uuid) -> AppResult<Option<GeneratedDocument>> {
        sqlx::query_as::<_, GeneratedDocument>("SELECT * FROM generated_documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find document"))
    }

    async fn list_documents(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<GeneratedDocument>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM generated_documents WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("Failed to count documents"))?;

        let items = sqlx::query_as::<_, GeneratedDocument>(
            "SELECT * FROM generated_documents WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list documents"))?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn list_unrefunded_failures(&self, limit: i64) -> AppResult<Vec<GeneratedDocument>> {
        sqlx::query_as::<_, GeneratedDocument>(
            "SELECT * FROM generated_documents \
             WHERE status = 'failed' AND refund_transaction_id IS NULL AND credits_charged > 0 \
             ORDER BY created_at LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list unrefunded documents"))
    }

    async fn list_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<GeneratedDocument>> {
        sqlx::query_as::<_, GeneratedDocument>(
            "SELECT * FROM generated_documents \
             WHERE status = 'pending' AND created_at < $1 \
             ORDER BY created_at LIMIT $2",
        )
        .bind(older_than)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list stale documents"))
    }

    async fn count_completed_for_school(&self, school_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM generated_documents d \
             JOIN app_users u ON u.id = d.user_id \
             WHERE u.school_id = $1 AND d.status = 'completed'",
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count generated documents"))
    }
}
