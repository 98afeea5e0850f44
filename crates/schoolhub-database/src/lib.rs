//! # schoolhub-database
//!
//! Persistence for SchoolHub. The [`store`] module defines one trait per
//! aggregate; [`repositories`] implements them on PostgreSQL and
//! [`memory::MemoryStore`] implements them in process for tests and
//! database-less development runs.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::Stores;
