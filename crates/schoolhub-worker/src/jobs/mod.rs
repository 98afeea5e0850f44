//! Built-in job handler implementations.

pub mod notification;
pub mod refund;

pub use notification::NotificationJobHandler;
pub use refund::RefundJobHandler;
