//! # schoolhub-entity
//!
//! Domain entity models for SchoolHub. Every struct in this crate
//! represents a database table row or a domain value object. Row types
//! derive `sqlx::FromRow` and serialize with camelCase keys, which is the
//! JSON contract the web frontend expects.

pub mod credit;
pub mod dashboard;
pub mod document;
pub mod inventory;
pub mod library;
pub mod notification;
pub mod school;
pub mod user;
