//! Route definitions for the SchoolHub HTTP API.
//!
//! REST routes are mounted under `/api`; the realtime feed lives at
//! `/ws/notifications`.

use axum::Router;
use axum::routing::{get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, without middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(user_routes())
        .merge(admin_routes())
        .merge(credit_routes())
        .merge(notification_routes())
        .merge(document_routes())
        .merge(school_routes());

    let ws_routes = Router::new().route(
        "/ws/notifications",
        get(handlers::ws::ws_notifications),
    );

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .with_state(state)
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// User self-service endpoints
fn user_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(handlers::user::me))
}

/// Admin user and ledger management
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/users",
            get(handlers::admin::users::list_users).post(handlers::admin::users::create_user),
        )
        .route(
            "/admin/users/{id}",
            get(handlers::admin::users::get_user).delete(handlers::admin::users::deactivate_user),
        )
        .route("/admin/credits/grant", post(handlers::admin::credits::grant))
        .route(
            "/admin/credits/{user_id}/status",
            put(handlers::admin::credits::set_status),
        )
        .route(
            "/admin/credits/{user_id}/audit",
            get(handlers::admin::credits::audit),
        )
}

/// Balance, history, debit and top-up
fn credit_routes() -> Router<AppState> {
    Router::new()
        .route("/credits/balance", get(handlers::credit::balance))
        .route("/credits/transactions", get(handlers::credit::transactions))
        .route("/credits/deduct", post(handlers::credit::deduct))
        .route("/credits/topup", post(handlers::credit::top_up))
}

/// Notification listing, publishing and read state
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications).post(handlers::notification::publish),
        )
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            put(handlers::notification::set_read),
        )
        .route(
            "/notifications/{id}",
            axum::routing::delete(handlers::notification::delete_notification),
        )
}

/// Templates and the generation gate
fn document_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/documents/templates",
            get(handlers::document::list_templates).post(handlers::document::create_template),
        )
        .route("/documents/generate", post(handlers::document::generate))
        .route("/documents", get(handlers::document::list_documents))
        .route("/documents/{id}", get(handlers::document::get_document))
}

/// School records and dashboard
fn school_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(handlers::dashboard::stats))
        .route(
            "/students",
            get(handlers::school::list_students).post(handlers::school::create_student),
        )
        .route(
            "/teachers",
            get(handlers::school::list_teachers).post(handlers::school::create_teacher),
        )
        .route(
            "/library/books",
            get(handlers::library::list_books).post(handlers::library::create_book),
        )
        .route(
            "/inventory/items",
            get(handlers::inventory::list_items).post(handlers::inventory::create_item),
        )
        .route(
            "/inventory/items/{id}/movements",
            get(handlers::inventory::list_movements).post(handlers::inventory::record_movement),
        )
}
