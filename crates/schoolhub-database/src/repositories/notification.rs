//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::notification::{NewNotification, Notification};
use schoolhub_entity::user::Viewer;

use crate::error::db_err;
use crate::store::NotificationStore;

/// Rows visible to the viewer bound as `$1` (id), `$2` (role), `$3` (school).
const VISIBLE_TO: &str = "(recipient_id = $1 OR (recipient_id IS NULL \
     AND (recipient_role IS NULL OR recipient_role = $2) \
     AND (school_id IS NULL OR school_id = $3)))";

/// Repository for `notifications`.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert_notification(&self, input: &NewNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications \
             (id, title, title_bn, message, message_bn, notification_type, priority, category, \
              recipient_id, recipient_role, school_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&input.title)
        .bind(&input.title_bn)
        .bind(&input.message)
        .bind(&input.message_bn)
        .bind(input.notification_type)
        .bind(input.priority)
        .bind(input.category)
        .bind(input.recipient_id)
        .bind(input.recipient_role)
        .bind(input.school_id)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create notification"))
    }

    async fn list_for_viewer(
        &self,
        viewer: &Viewer,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications WHERE {VISIBLE_TO} AND (NOT $4 OR NOT is_read)"
        ))
        .bind(viewer.user_id)
        .bind(viewer.role)
        .bind(viewer.school_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count notifications"))?;

        let items = sqlx::query_as::<_, Notification>(&format!(
            "SELECT * FROM notifications WHERE {VISIBLE_TO} AND (NOT $4 OR NOT is_read) \
             ORDER BY created_at DESC LIMIT $5 OFFSET $6"
        ))
        .bind(viewer.user_id)
        .bind(viewer.role)
        .bind(viewer.school_id)
        .bind(unread_only)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list notifications"))?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn find_notification(&self, id: Uuid) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find notification"))
    }

    async fn set_read(&self, id: Uuid, is_read: bool) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications \
             SET is_read = $2, \
                 read_at = CASE WHEN $2 THEN COALESCE(read_at, NOW()) ELSE NULL END, \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_read)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update read state"))?
        .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    async fn mark_all_read(&self, viewer: &Viewer) -> AppResult<u64> {
        let result = sqlx::query(&format!(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW(), updated_at = NOW() \
             WHERE {VISIBLE_TO} AND NOT is_read"
        ))
        .bind(viewer.user_id)
        .bind(viewer.role)
        .bind(viewer.school_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark all read"))?;
        Ok(result.rows_affected())
    }

    async fn count_unread(&self, viewer: &Viewer) -> AppResult<i64> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications WHERE {VISIBLE_TO} AND NOT is_read"
        ))
        .bind(viewer.user_id)
        .bind(viewer.role)
        .bind(viewer.school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count unread"))
    }

    async fn delete_notification(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete notification"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn prune_before(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to prune notifications"))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_entity::notification::{NotificationCategory, NotificationType};
    use schoolhub_entity::user::{CreateUser, UserRole};

    use crate::repositories::UserRepository;
    use crate::store::UserStore;

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn read_toggle_persists(pool: PgPool) {
        let (user, _) = UserRepository::new(pool.clone())
            .create_user(
                &CreateUser {
                    id: None,
                    email: "reader@school.test".into(),
                    full_name: "Reader".into(),
                    full_name_bn: None,
                    role: UserRole::Student,
                    school_id: None,
                },
                0,
            )
            .await
            .unwrap();
        let repo = NotificationRepository::new(pool);
        let n = repo
            .insert_notification(&NewNotification::direct(
                user.id,
                NotificationType::Info,
                NotificationCategory::General,
                "Hello",
                "World",
            ))
            .await
            .unwrap();

        let viewer = user.viewer();
        let unread = repo
            .list_for_viewer(&viewer, true, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(unread.items.len(), 1);

        repo.set_read(n.id, true).await.unwrap();
        assert_eq!(repo.count_unread(&viewer).await.unwrap(), 0);
        assert!(repo.find_notification(n.id).await.unwrap().unwrap().is_read);

        repo.set_read(n.id, false).await.unwrap();
        assert_eq!(repo.count_unread(&viewer).await.unwrap(), 1);
    }
}
