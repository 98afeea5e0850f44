//! User domain entities.

pub mod model;
pub mod role;
pub mod status;
pub mod viewer;

pub use model::{CreateUser, User};
pub use role::UserRole;
pub use status::UserStatus;
pub use viewer::Viewer;
