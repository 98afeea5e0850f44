//! Admin-only handlers.

pub mod credits;
pub mod users;
