//! `AuthUser` extractor: pulls the JWT from the Authorization header,
//! validates it, and resolves the account behind it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use schoolhub_core::error::AppError;
use schoolhub_service::context::RequestContext;

use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Verify `token` and load the active account it names.
///
/// Role and school come from the stored account, so a role change takes
/// effect without reissuing tokens.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<RequestContext, AppError> {
    let claims = state.jwt_decoder.decode(token)?;
    let user = state.services.users.authenticate(claims.user_id()).await?;
    Ok(RequestContext::new(user.id, user.role, user.school_id))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;

        let ctx = authenticate_token(state, token.trim()).await?;
        Ok(AuthUser(ctx))
    }
}
