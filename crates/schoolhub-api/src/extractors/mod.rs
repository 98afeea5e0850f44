//! Custom Axum extractors.

pub mod auth;
pub mod json;
pub mod pagination;

pub use auth::AuthUser;
pub use json::ValidatedJson;
pub use pagination::PaginationParams;
