//! # schoolhub-auth
//!
//! Session token handling and role-based authorization for SchoolHub.
//!
//! ## Modules
//!
//! - `jwt`: HS256 session token signing and verification
//! - `rbac`: role-based permission checks for school operations

pub mod jwt;
pub mod rbac;

pub use jwt::{Claims, IssuedToken, JwtDecoder, JwtEncoder};
pub use rbac::{RbacEnforcer, RbacPolicies, SystemPermission};
