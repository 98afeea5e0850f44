//! Dashboard handler.

use axum::Json;
use axum::extract::{Query, State};

use schoolhub_core::error::AppError;
use schoolhub_entity::dashboard::DashboardStats;

use crate::dto::request::SchoolQuery;
use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/dashboard/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SchoolQuery>,
) -> Result<Json<ApiResponse<DashboardStats>>, AppError> {
    let stats = state.services.dashboard.stats(&auth, query.school_id).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
