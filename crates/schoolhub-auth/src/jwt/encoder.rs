//! Session token signing.
//!
//! Production tokens come from the auth provider; this encoder issues
//! compatible tokens for the CLI and for tests.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schoolhub_core::config::auth::AuthConfig;
use schoolhub_core::error::AppError;
use schoolhub_entity::user::UserRole;

use super::claims::Claims;

/// Creates HS256-signed session tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Token TTL in minutes.
    ttl_minutes: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    /// The compact JWT.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.session_secret.as_bytes()),
            ttl_minutes: config.token_ttl_minutes,
        }
    }

    /// Issue a token using the configured TTL.
    pub fn issue(
        &self,
        user_id: Uuid,
        role: UserRole,
        school_id: Option<Uuid>,
    ) -> Result<IssuedToken, AppError> {
        self.issue_with_ttl(user_id, role, school_id, Duration::minutes(self.ttl_minutes))
    }

    /// Issue a token valid for `ttl`.
    pub fn issue_with_ttl(
        &self,
        user_id: Uuid,
        role: UserRole,
        school_id: Option<Uuid>,
        ttl: Duration,
    ) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let claims = Claims {
            sub: user_id,
            role,
            school_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode session token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}
