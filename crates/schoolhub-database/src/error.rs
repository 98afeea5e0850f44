//! Classification of sqlx errors into application errors.
//!
//! This is the only place that inspects SQLSTATE codes. Infrastructure
//! failures of the managed Postgres provider become
//! [`ErrorKind::ControlPlane`], unique violations become
//! [`ErrorKind::Conflict`], integer overflow of a stored amount becomes
//! [`ErrorKind::Validation`], and everything else is an
//! [`ErrorKind::UpstreamService`] failure.

use schoolhub_core::error::{AppError, ErrorKind};

/// SQLSTATE codes outside class `08` that signal provider trouble.
const CONTROL_PLANE_STATES: &[&str] = &["53300", "57P01", "57P02", "57P03"];

/// Whether `err` is an infrastructure failure rather than a query failure.
pub fn is_control_plane(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => {
            let code_matches = db
                .code()
                .is_some_and(|c| c.starts_with("08") || CONTROL_PLANE_STATES.contains(&&*c));
            code_matches || db.message().to_lowercase().contains("control plane")
        }
        other => other.to_string().to_lowercase().contains("control plane"),
    }
}

/// Whether `err` is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether `err` is a numeric value out of range (SQLSTATE `22003`).
pub fn is_out_of_range(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("22003"))
}

/// Convert a sqlx error into an [`AppError`], prefixing `context`.
pub fn classify(err: sqlx::Error, context: &str) -> AppError {
    let kind = if is_control_plane(&err) {
        ErrorKind::ControlPlane
    } else if is_unique_violation(&err) {
        ErrorKind::Conflict
    } else if is_out_of_range(&err) {
        ErrorKind::Validation
    } else {
        ErrorKind::UpstreamService
    };
    AppError::with_source(kind, format!("{context}: {err}"), err)
}

/// `map_err` adapter for [`classify`].
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |err| classify(err, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_control_plane() {
        let err = classify(sqlx::Error::PoolTimedOut, "Failed to fetch balance");
        assert_eq!(err.kind, ErrorKind::ControlPlane);
        assert!(err.message.starts_with("Failed to fetch balance"));
    }

    #[test]
    fn test_io_is_control_plane() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        assert_eq!(classify(sqlx::Error::Io(io), "x").kind, ErrorKind::ControlPlane);
    }

    #[test]
    fn test_row_not_found_is_upstream() {
        assert_eq!(
            classify(sqlx::Error::RowNotFound, "x").kind,
            ErrorKind::UpstreamService
        );
    }

    #[test]
    fn test_protocol_message_mentioning_control_plane() {
        let err = sqlx::Error::Protocol("upstream control plane request failed".into());
        assert!(is_control_plane(&err));
    }
}
