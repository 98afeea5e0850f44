//! # schoolhub-api
//!
//! HTTP API layer for SchoolHub built on Axum.
//!
//! Provides the REST endpoints, the realtime notification WebSocket,
//! middleware (CORS, logging, limits), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, serve};
pub use state::AppState;
