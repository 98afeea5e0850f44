//! User self-service handlers.

use axum::Json;
use axum::extract::State;

use schoolhub_core::error::AppError;
use schoolhub_entity::user::User;

use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.services.users.me(&auth).await?;
    Ok(Json(ApiResponse::ok(user)))
}
