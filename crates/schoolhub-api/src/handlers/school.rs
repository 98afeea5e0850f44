//! Student and teacher handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::PageResponse;
use schoolhub_entity::school::{Student, Teacher};

use crate::dto::request::{CreateStudentRequest, CreateTeacherRequest, SchoolQuery, StudentQuery};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/students
pub async fn list_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StudentQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Student>>>, AppError> {
    let page = state
        .services
        .roster
        .list_students(
            &auth,
            query.school_id,
            query.search,
            query.class_name,
            params.into_page_request(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/students
pub async fn create_student(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Student>>), AppError> {
    let school_id = auth.resolve_school(req.school_id)?;
    let student = state
        .services
        .roster
        .create_student(&auth, req.into_new(school_id))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(student))))
}

/// GET /api/teachers
pub async fn list_teachers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SchoolQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Teacher>>>, AppError> {
    let page = state
        .services
        .roster
        .list_teachers(&auth, query.school_id, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/teachers
pub async fn create_teacher(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateTeacherRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Teacher>>), AppError> {
    let school_id = auth.resolve_school(req.school_id)?;
    let teacher = state
        .services
        .roster
        .create_teacher(&auth, req.into_new(school_id))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(teacher))))
}
