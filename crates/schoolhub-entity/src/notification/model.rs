//! Notification entity model and scope matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::category::NotificationCategory;
use super::kind::{NotificationPriority, NotificationType};
use crate::user::{UserRole, Viewer};

/// A persisted notification. Only the read state is mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Title in Bengali.
    pub title_bn: Option<String>,
    /// Body text.
    pub message: String,
    /// Body text in Bengali.
    pub message_bn: Option<String>,
    /// Visual tone.
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Urgency.
    pub priority: NotificationPriority,
    /// Category.
    pub category: NotificationCategory,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// When it was read.
    pub read_at: Option<DateTime<Utc>>,
    /// Single recipient, when targeted at one user.
    pub recipient_id: Option<Uuid>,
    /// Role scope, when targeted at a role.
    pub recipient_role: Option<UserRole>,
    /// School scope.
    pub school_id: Option<Uuid>,
    /// Who published it; `None` for system notices.
    pub created_by: Option<Uuid>,
    /// When it was published.
    pub created_at: DateTime<Utc>,
    /// When the read state last changed.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Whether `viewer` is in this notification's audience.
    ///
    /// A direct recipient always matches. Otherwise every scope that is set
    /// (role, school) must match the viewer.
    pub fn is_visible_to(&self, viewer: &Viewer) -> bool {
        if let Some(recipient) = self.recipient_id {
            return recipient == viewer.user_id;
        }
        let role_ok = self.recipient_role.is_none_or(|r| r == viewer.role);
        let school_ok = self
            .school_id
            .is_none_or(|s| viewer.school_id == Some(s));
        role_ok && school_ok
    }
}

/// Data required to publish a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    /// Title.
    pub title: String,
    /// Title in Bengali.
    pub title_bn: Option<String>,
    /// Body text.
    pub message: String,
    /// Body text in Bengali.
    pub message_bn: Option<String>,
    /// Visual tone.
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Urgency.
    pub priority: NotificationPriority,
    /// Category.
    pub category: NotificationCategory,
    /// Single recipient.
    pub recipient_id: Option<Uuid>,
    /// Role scope.
    pub recipient_role: Option<UserRole>,
    /// School scope.
    pub school_id: Option<Uuid>,
    /// Publisher.
    pub created_by: Option<Uuid>,
}

impl NewNotification {
    /// A system notification addressed to one user.
    pub fn direct(
        recipient_id: Uuid,
        notification_type: NotificationType,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            title_bn: None,
            message: message.into(),
            message_bn: None,
            notification_type,
            priority: NotificationPriority::Normal,
            category,
            recipient_id: Some(recipient_id),
            recipient_role: None,
            school_id: None,
            created_by: None,
        }
    }

    /// Attach Bengali variants.
    pub fn with_bengali(mut self, title_bn: impl Into<String>, message_bn: impl Into<String>) -> Self {
        self.title_bn = Some(title_bn.into());
        self.message_bn = Some(message_bn.into());
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Materialize the row this input produces.
    pub fn into_notification(self, id: Uuid, now: DateTime<Utc>) -> Notification {
        Notification {
            id,
            title: self.title,
            title_bn: self.title_bn,
            message: self.message,
            message_bn: self.message_bn,
            notification_type: self.notification_type,
            priority: self.priority,
            category: self.category,
            is_read: false,
            read_at: None,
            recipient_id: self.recipient_id,
            recipient_role: self.recipient_role,
            school_id: self.school_id,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(role: UserRole, school_id: Option<Uuid>) -> Viewer {
        Viewer {
            user_id: Uuid::new_v4(),
            role,
            school_id,
        }
    }

    fn broadcast(role: Option<UserRole>, school: Option<Uuid>) -> Notification {
        NewNotification {
            recipient_role: role,
            school_id: school,
            recipient_id: None,
            ..NewNotification::direct(
                Uuid::nil(),
                NotificationType::Info,
                NotificationCategory::General,
                "Exam schedule",
                "Published",
            )
        }
        .into_notification(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_direct_recipient_only() {
        let me = viewer(UserRole::Student, None);
        let other = viewer(UserRole::Student, None);
        let n = NewNotification::direct(
            me.user_id,
            NotificationType::Success,
            NotificationCategory::Finance,
            "Credits added",
            "100 credits",
        )
        .into_notification(Uuid::new_v4(), Utc::now());

        assert!(n.is_visible_to(&me));
        assert!(!n.is_visible_to(&other));
        assert!(!n.is_read);
    }

    #[test]
    fn test_role_and_school_scope() {
        let school = Uuid::new_v4();
        let n = broadcast(Some(UserRole::Teacher), Some(school));

        assert!(n.is_visible_to(&viewer(UserRole::Teacher, Some(school))));
        assert!(!n.is_visible_to(&viewer(UserRole::Student, Some(school))));
        assert!(!n.is_visible_to(&viewer(UserRole::Teacher, Some(Uuid::new_v4()))));
        assert!(!n.is_visible_to(&viewer(UserRole::Teacher, None)));
    }

    #[test]
    fn test_everyone() {
        let n = broadcast(None, None);
        assert!(n.is_visible_to(&viewer(UserRole::Parent, None)));
        assert!(n.is_visible_to(&viewer(UserRole::Admin, Some(Uuid::new_v4()))));
    }
}
