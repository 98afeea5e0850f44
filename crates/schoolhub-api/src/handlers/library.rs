//! Library handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::PageResponse;
use schoolhub_entity::library::LibraryBook;

use crate::dto::request::{BookQuery, CreateBookRequest};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/library/books
pub async fn list_books(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BookQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<LibraryBook>>>, AppError> {
    let page = state
        .services
        .library
        .list_books(
            &auth,
            query.school_id,
            query.search,
            query.category,
            params.into_page_request(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/library/books
pub async fn create_book(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBookRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LibraryBook>>), AppError> {
    let school_id = auth.resolve_school(req.school_id)?;
    let book = state
        .services
        .library
        .create_book(&auth, req.into_new(school_id))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(book))))
}
