//! Admin ledger handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_entity::credit::{CreditBalance, LedgerMovement};
use schoolhub_service::LedgerAudit;

use crate::dto::request::{BalanceStatusRequest, GrantRequest};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/admin/credits/grant
pub async fn grant(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<GrantRequest>,
) -> Result<Json<ApiResponse<LedgerMovement>>, AppError> {
    let movement = state
        .services
        .credits
        .grant_bonus(&auth, req.user_id, req.amount, &req.reason)
        .await?;
    Ok(Json(ApiResponse::ok(movement)))
}

/// PUT /api/admin/credits/{user_id}/status
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<BalanceStatusRequest>,
) -> Result<Json<ApiResponse<CreditBalance>>, AppError> {
    let balance = state
        .services
        .credits
        .set_status(&auth, user_id, req.status)
        .await?;
    Ok(Json(ApiResponse::ok(balance)))
}

/// GET /api/admin/credits/{user_id}/audit
pub async fn audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<LedgerAudit>>, AppError> {
    auth.require(schoolhub_auth::SystemPermission::CreditViewAny)?;
    let audit = state.services.credits.audit(user_id).await?;
    Ok(Json(ApiResponse::ok(audit)))
}
