//! Notification fan-out.

pub mod hub;
pub mod service;

pub use hub::NotificationHub;
pub use service::NotificationService;
