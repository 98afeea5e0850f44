//! Admin user management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::PageResponse;
use schoolhub_entity::user::User;

use crate::dto::request::{CreateUserRequest, SchoolQuery};
use crate::dto::response::{ApiResponse, CreatedUserResponse};
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(school): Query<SchoolQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<User>>>, AppError> {
    let page = state
        .services
        .users
        .list(&auth, school.school_id, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedUserResponse>>), AppError> {
    let (user, balance) = state.services.users.create(&auth, req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CreatedUserResponse { user, balance })),
    ))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.services.users.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// DELETE /api/admin/users/{id}
pub async fn deactivate_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.services.users.deactivate(&auth, id).await?;
    Ok(Json(ApiResponse::ok(user)))
}
