//! # schoolhub-core
//!
//! Core crate for SchoolHub. Contains the configuration schema,
//! pagination types, and the unified error system shared by every
//! other crate in the workspace.
//!
//! This crate has **no** internal dependencies on other SchoolHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
