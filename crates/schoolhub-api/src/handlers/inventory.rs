//! Inventory handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::PageResponse;
use schoolhub_entity::inventory::{InventoryItem, StockMovement};

use crate::dto::request::{CreateItemRequest, SchoolQuery, StockMovementRequest};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// An item after a stock movement, with the movement itself.
#[derive(Debug, Serialize)]
pub struct MovementResponse {
    /// The item with its new quantity.
    pub item: InventoryItem,
    /// The logged movement.
    pub movement: StockMovement,
}

/// GET /api/inventory/items
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SchoolQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<InventoryItem>>>, AppError> {
    let page = state
        .services
        .inventory
        .list_items(&auth, query.school_id, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/inventory/items
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryItem>>), AppError> {
    let school_id = auth.resolve_school(req.school_id)?;
    let item = state
        .services
        .inventory
        .create_item(&auth, req.into_new(school_id))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

/// GET /api/inventory/items/{id}/movements
pub async fn list_movements(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<StockMovement>>>, AppError> {
    let page = state
        .services
        .inventory
        .list_movements(&auth, id, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/inventory/items/{id}/movements
pub async fn record_movement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<StockMovementRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MovementResponse>>), AppError> {
    let (item, movement) = state
        .services
        .inventory
        .record_movement(&auth, id, req.delta, &req.reason)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(MovementResponse { item, movement })),
    ))
}
