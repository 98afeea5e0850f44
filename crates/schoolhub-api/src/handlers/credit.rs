//! Credit ledger handlers.

use axum::Json;
use axum::extract::{Query, State};

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::PageResponse;
use schoolhub_entity::credit::{CreditBalance, CreditTransaction, LedgerMovement, TopUpOutcome};

use crate::dto::request::{DeductRequest, TopUpRequest, UserQuery};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/credits/balance
pub async fn balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<CreditBalance>>, AppError> {
    let balance = state
        .services
        .credits
        .get_balance(&auth, query.user_id)
        .await?;
    Ok(Json(ApiResponse::ok(balance)))
}

/// GET /api/credits/transactions
pub async fn transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UserQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<CreditTransaction>>>, AppError> {
    let page = state
        .services
        .credits
        .list_transactions(&auth, query.user_id, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/credits/deduct
pub async fn deduct(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<DeductRequest>,
) -> Result<Json<ApiResponse<LedgerMovement>>, AppError> {
    let movement = state
        .services
        .credits
        .deduct(&auth, req.amount, &req.reason, req.reference.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(movement)))
}

/// POST /api/credits/topup
///
/// A replayed `externalTransactionId` answers with the `duplicate` outcome
/// and the original payment.
pub async fn top_up(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<TopUpRequest>,
) -> Result<Json<ApiResponse<TopUpOutcome>>, AppError> {
    let user_id = match req.user_id {
        Some(id) if id != auth.user_id => {
            auth.require(SystemPermission::CreditGrant)?;
            id
        }
        _ => auth.user_id,
    };
    let outcome = state
        .services
        .credits
        .top_up(
            user_id,
            req.amount,
            req.payment_method,
            &req.external_transaction_id,
        )
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}
