//! Notification domain entities.

pub mod category;
pub mod kind;
pub mod model;

pub use category::NotificationCategory;
pub use kind::{NotificationPriority, NotificationType};
pub use model::{NewNotification, Notification};
