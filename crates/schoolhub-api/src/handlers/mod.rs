//! Route handlers organized by domain.

pub mod admin;
pub mod credit;
pub mod dashboard;
pub mod document;
pub mod health;
pub mod inventory;
pub mod library;
pub mod notification;
pub mod school;
pub mod user;
pub mod ws;
