//! Request context carrying the authenticated user and their scope.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schoolhub_auth::rbac::{RbacEnforcer, SystemPermission};
use schoolhub_core::error::AppError;
use schoolhub_entity::user::{UserRole, Viewer};

static ENFORCER: LazyLock<RbacEnforcer> = LazyLock::new(RbacEnforcer::new);

/// Context for the current authenticated request.
///
/// Built from verified token claims by the API extractors and passed into
/// service methods so that every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    /// The user's school, if any.
    pub school_id: Option<Uuid>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Uuid, role: UserRole, school_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role,
            school_id,
            request_time: Utc::now(),
        }
    }

    /// Context for operator actions (CLI, background jobs).
    pub fn system() -> Self {
        Self::new(Uuid::nil(), UserRole::Admin, None)
    }

    /// The identity used for notification visibility.
    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.user_id,
            role: self.role,
            school_id: self.school_id,
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail with `Forbidden` unless the role holds `permission`.
    pub fn require(&self, permission: SystemPermission) -> Result<(), AppError> {
        ENFORCER.require_permission(&self.role, &permission)
    }

    /// Fail with `Forbidden` unless the caller may read `school_id`'s data.
    pub fn require_school(&self, school_id: Uuid) -> Result<(), AppError> {
        if self.viewer().can_access_school(school_id) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "No access to school {school_id}"
            )))
        }
    }

    /// The school to act on: the explicit one if given and accessible,
    /// otherwise the caller's own.
    pub fn resolve_school(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match requested.or(self.school_id) {
            Some(school_id) => {
                self.require_school(school_id)?;
                Ok(school_id)
            }
            None => Err(AppError::validation("schoolId is required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_school_defaults_to_own() {
        let school = Uuid::new_v4();
        let ctx = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, Some(school));
        assert_eq!(ctx.resolve_school(None).unwrap(), school);
        assert!(ctx.resolve_school(Some(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_platform_admin_must_name_a_school() {
        let ctx = RequestContext::system();
        assert!(ctx.resolve_school(None).is_err());
        let school = Uuid::new_v4();
        assert_eq!(ctx.resolve_school(Some(school)).unwrap(), school);
    }
}
