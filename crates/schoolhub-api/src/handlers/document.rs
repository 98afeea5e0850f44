//! Template and document generation handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::PageResponse;
use schoolhub_entity::document::{DocumentTemplate, GeneratedDocument};

use crate::dto::request::{CreateTemplateRequest, GenerateDocumentRequest, TemplateQuery};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/documents/templates
pub async fn list_templates(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<ApiResponse<Vec<DocumentTemplate>>>, AppError> {
    let templates = state
        .services
        .documents
        .list_templates(&auth, query.category, query.include_inactive)
        .await?;
    Ok(Json(ApiResponse::ok(templates)))
}

/// POST /api/documents/templates
pub async fn create_template(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentTemplate>>), AppError> {
    let template = state
        .services
        .documents
        .create_template(&auth, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(template))))
}

/// POST /api/documents/generate
pub async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<GenerateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GeneratedDocument>>), AppError> {
    let document = state
        .services
        .documents
        .generate(&auth, req.template_id, req.input_data)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(document))))
}

/// GET /api/documents
pub async fn list_documents(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<GeneratedDocument>>>, AppError> {
    let page = state
        .services
        .documents
        .list_documents(&auth, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GeneratedDocument>>, AppError> {
    let document = state.services.documents.get_document(&auth, id).await?;
    Ok(Json(ApiResponse::ok(document)))
}
