//! Unified application error types for SchoolHub.
//!
//! Every crate maps its failures into [`AppError`] so that the `?`
//! operator works from the repositories all the way up to the HTTP
//! handlers, where the [`ErrorKind`] decides the status code.

use std::fmt;
use thiserror::Error;

/// Category of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested row does not exist.
    NotFound,
    /// The request body or parameters are malformed.
    Validation,
    /// The credit balance cannot cover the requested debit.
    InsufficientCredits,
    /// A uniqueness or state conflict (duplicate key, illegal transition).
    Conflict,
    /// No valid session token was presented.
    Unauthorized,
    /// The caller is authenticated but not allowed to act.
    Forbidden,
    /// The database or another upstream service failed.
    UpstreamService,
    /// The managed database provider's infrastructure failed
    /// (connection loss, pool exhaustion, provider-side outage).
    ControlPlane,
    /// Configuration could not be loaded or is invalid.
    Configuration,
    /// A value could not be serialized or deserialized.
    Serialization,
    /// Artifact storage I/O failed.
    Storage,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::InsufficientCredits => "INSUFFICIENT_CREDITS",
            Self::Conflict => "CONFLICT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::UpstreamService => "UPSTREAM_SERVICE_ERROR",
            Self::ControlPlane => "CONTROL_PLANE_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The unified application error used throughout SchoolHub.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an insufficient-credits error for a rejected debit.
    pub fn insufficient_credits(requested: i64, available: i64) -> Self {
        Self::new(
            ErrorKind::InsufficientCredits,
            format!("Insufficient credits: requested {requested}, available {available}"),
        )
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create an upstream-service error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamService, message)
    }

    /// Create a control-plane error.
    pub fn control_plane(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ControlPlane, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error came from the database provider's infrastructure.
    pub fn is_control_plane(&self) -> bool {
        self.kind == ErrorKind::ControlPlane
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_message() {
        let err = AppError::insufficient_credits(15, 10);
        assert_eq!(err.kind, ErrorKind::InsufficientCredits);
        assert_eq!(
            err.to_string(),
            "INSUFFICIENT_CREDITS: Insufficient credits: requested 15, available 10"
        );
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("disk full");
        let err = AppError::from(io);
        assert!(err.source.is_some());
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Storage);
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_control_plane_flag() {
        assert!(AppError::control_plane("pool timed out").is_control_plane());
        assert!(!AppError::upstream("syntax error").is_control_plane());
    }
}
