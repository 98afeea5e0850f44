//! Notification publishing, listing and read state.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_database::store::NotificationStore;
use schoolhub_entity::notification::{NewNotification, Notification};

use super::hub::NotificationHub;
use crate::context::RequestContext;

/// Persists notifications and fans them out to realtime subscribers.
#[derive(Clone)]
pub struct NotificationService {
    /// Notification rows.
    store: Arc<dyn NotificationStore>,
    /// Realtime fan-out.
    hub: NotificationHub,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("subscribers", &self.hub.subscriber_count())
            .finish()
    }
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>, hub: NotificationHub) -> Self {
        Self { store, hub }
    }

    /// The realtime hub WebSocket sessions subscribe to.
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Publish a notification on behalf of the caller.
    ///
    /// Non-admin publishers are confined to their own school. One that
    /// belongs to no school cannot publish at all.
    pub async fn publish(
        &self,
        ctx: &RequestContext,
        mut input: NewNotification,
    ) -> Result<Notification, AppError> {
        ctx.require(SystemPermission::NotificationPublish)?;
        if input.title.trim().is_empty() || input.message.trim().is_empty() {
            return Err(AppError::validation("title and message are required"));
        }
        if !ctx.is_admin() {
            match (input.school_id, ctx.school_id) {
                (None, Some(own)) => input.school_id = Some(own),
                (None, None) => {
                    return Err(AppError::validation(
                        "Only publishers assigned to a school can publish notifications",
                    ));
                }
                (Some(target), _) => ctx.require_school(target)?,
            }
        }
        input.created_by = Some(ctx.user_id);
        self.notify(input).await
    }

    /// Insert a notification and broadcast it. The insert is the only
    /// part that can fail; the broadcast is best-effort.
    pub async fn notify(&self, input: NewNotification) -> Result<Notification, AppError> {
        let notification = self.store.insert_notification(&input).await?;
        let receivers = self.hub.publish(&notification);
        info!(
            notification_id = %notification.id,
            category = %notification.category,
            receivers,
            "Notification published"
        );
        Ok(notification)
    }

    /// Like [`notify`](Self::notify), but a failure is logged and swallowed.
    pub async fn notify_best_effort(&self, input: NewNotification) -> Option<Notification> {
        match self.notify(input).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!(error = %e, "Failed to deliver notification");
                None
            }
        }
    }

    /// Lists notifications visible to the caller, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<PageResponse<Notification>, AppError> {
        self.store
            .list_for_viewer(&ctx.viewer(), unread_only, page.normalized())
            .await
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, ctx: &RequestContext) -> Result<i64, AppError> {
        self.store.count_unread(&ctx.viewer()).await
    }

    /// Sets the read flag on one notification the caller can see.
    pub async fn set_read(
        &self,
        ctx: &RequestContext,
        notification_id: Uuid,
        is_read: bool,
    ) -> Result<Notification, AppError> {
        let visible = self
            .store
            .find_notification(notification_id)
            .await?
            .filter(|n| n.is_visible_to(&ctx.viewer()));
        if visible.is_none() {
            return Err(AppError::not_found(format!(
                "Notification {notification_id} not found"
            )));
        }
        self.store.set_read(notification_id, is_read).await
    }

    /// Marks every visible notification as read.
    pub async fn mark_all_read(&self, ctx: &RequestContext) -> Result<u64, AppError> {
        self.store.mark_all_read(&ctx.viewer()).await
    }

    /// Deletes a notification (admin).
    pub async fn delete(&self, ctx: &RequestContext, notification_id: Uuid) -> Result<(), AppError> {
        ctx.require(SystemPermission::NotificationDelete)?;
        if !self.store.delete_notification(notification_id).await? {
            return Err(AppError::not_found(format!(
                "Notification {notification_id} not found"
            )));
        }
        info!(notification_id = %notification_id, deleted_by = %ctx.user_id, "Notification deleted");
        Ok(())
    }

    /// Deletes notifications older than `retention_days`.
    pub async fn prune(&self, retention_days: i64) -> Result<u64, AppError> {
        if retention_days < 0 {
            return Err(AppError::validation("retention days must not be negative"));
        }
        let cutoff = Utc::now() - Duration::days(retention_days);
        let removed = self.store.prune_before(cutoff).await?;
        info!(removed, %cutoff, "Pruned notifications");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_core::ErrorKind;
    use schoolhub_database::MemoryStore;
    use schoolhub_entity::notification::{NotificationCategory, NotificationType};
    use schoolhub_entity::user::UserRole;

    fn service() -> NotificationService {
        NotificationService::new(Arc::new(MemoryStore::new()), NotificationHub::new(8))
    }

    fn announcement(school: Option<Uuid>) -> NewNotification {
        NewNotification {
            title: "Exam schedule".into(),
            title_bn: Some("পরীক্ষার সময়সূচি".into()),
            message: "Exams start Sunday".into(),
            message_bn: None,
            notification_type: NotificationType::Info,
            priority: Default::default(),
            category: NotificationCategory::Academic,
            recipient_id: None,
            recipient_role: None,
            school_id: school,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_read_toggle_persists() {
        let svc = service();
        let school = Uuid::new_v4();
        let teacher = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, Some(school));
        let student = RequestContext::new(Uuid::new_v4(), UserRole::Student, Some(school));

        let published = svc.publish(&teacher, announcement(None)).await.unwrap();
        assert_eq!(published.school_id, Some(school));

        let listed = svc.list(&student, true, PageRequest::default()).await.unwrap();
        assert_eq!(listed.items.len(), 1);
        assert!(!listed.items[0].is_read);

        svc.set_read(&student, published.id, true).await.unwrap();
        assert_eq!(svc.unread_count(&student).await.unwrap(), 0);

        let toggled = svc.set_read(&student, published.id, false).await.unwrap();
        assert!(!toggled.is_read);
        assert!(toggled.read_at.is_none());
    }

    #[tokio::test]
    async fn test_student_cannot_publish() {
        let svc = service();
        let student = RequestContext::new(Uuid::new_v4(), UserRole::Student, None);
        let err = svc.publish(&student, announcement(None)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_schoolless_teacher_cannot_publish() {
        let svc = service();
        let teacher = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, None);
        let err = svc.publish(&teacher, announcement(None)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let elsewhere = RequestContext::new(Uuid::new_v4(), UserRole::Student, Some(Uuid::new_v4()));
        assert_eq!(svc.unread_count(&elsewhere).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_other_school_cannot_see_or_mark() {
        let svc = service();
        let school = Uuid::new_v4();
        let teacher = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, Some(school));
        let outsider = RequestContext::new(Uuid::new_v4(), UserRole::Student, Some(Uuid::new_v4()));

        let published = svc.publish(&teacher, announcement(None)).await.unwrap();
        let err = svc.set_read(&outsider, published.id, true).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let svc = service();
        let mut rx = svc.hub().subscribe();
        let admin = RequestContext::new(Uuid::new_v4(), UserRole::Admin, None);
        let published = svc.publish(&admin, announcement(None)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().id, published.id);
    }

    #[tokio::test]
    async fn test_prune_keeps_recent() {
        let svc = service();
        let admin = RequestContext::new(Uuid::new_v4(), UserRole::Admin, None);
        svc.publish(&admin, announcement(None)).await.unwrap();
        assert_eq!(svc.prune(30).await.unwrap(), 0);
    }
}
