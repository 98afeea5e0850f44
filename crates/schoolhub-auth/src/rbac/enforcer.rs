//! RBAC enforcement logic: checks whether a role holds a permission.

use schoolhub_core::error::AppError;
use schoolhub_entity::user::UserRole;

use super::policies::{RbacPolicies, SystemPermission};

/// Enforces role-based access control for school operations.
#[derive(Debug, Clone)]
pub struct RbacEnforcer {
    /// The policy configuration.
    policies: RbacPolicies,
}

impl RbacEnforcer {
    /// Creates a new enforcer with the default policy set.
    pub fn new() -> Self {
        Self {
            policies: RbacPolicies::new(),
        }
    }

    /// Creates an enforcer with custom policies.
    pub fn with_policies(policies: RbacPolicies) -> Self {
        Self { policies }
    }

    /// Returns `Err(AppError::Forbidden)` unless the role holds the permission.
    pub fn require_permission(
        &self,
        role: &UserRole,
        permission: &SystemPermission,
    ) -> Result<(), AppError> {
        if self.policies.has_permission(role, permission) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Role '{role}' does not have permission '{permission:?}'"
            )))
        }
    }

    /// Checks whether the role has the required permission (returns bool).
    pub fn has_permission(&self, role: &UserRole, permission: &SystemPermission) -> bool {
        self.policies.has_permission(role, permission)
    }

    /// Checks whether the given role is at least the specified minimum role.
    ///
    /// Role hierarchy: Admin > Teacher > Student = Parent
    pub fn require_minimum_role(
        &self,
        actual_role: &UserRole,
        minimum_role: &UserRole,
    ) -> Result<(), AppError> {
        if role_level(actual_role) >= role_level(minimum_role) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Role '{actual_role}' is insufficient; minimum required: '{minimum_role}'"
            )))
        }
    }

    /// Returns a reference to the underlying policies.
    pub fn policies(&self) -> &RbacPolicies {
        &self.policies
    }
}

impl Default for RbacEnforcer {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps roles to a numeric level for hierarchy comparison.
fn role_level(role: &UserRole) -> u8 {
    match role {
        UserRole::Student | UserRole::Parent => 0,
        UserRole::Teacher => 1,
        UserRole::Admin => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_everything_teacher_holds() {
        let enforcer = RbacEnforcer::new();
        for p in enforcer.policies().permissions_for(&UserRole::Teacher) {
            assert!(enforcer.has_permission(&UserRole::Admin, &p));
        }
    }

    #[test]
    fn test_student_cannot_grant_credits() {
        let enforcer = RbacEnforcer::new();
        let err = enforcer
            .require_permission(&UserRole::Student, &SystemPermission::CreditGrant)
            .unwrap_err();
        assert_eq!(err.kind, schoolhub_core::ErrorKind::Forbidden);
        assert!(enforcer
            .require_permission(&UserRole::Student, &SystemPermission::DocumentGenerate)
            .is_ok());
    }

    #[test]
    fn test_teacher_publishes_but_does_not_delete() {
        let enforcer = RbacEnforcer::new();
        assert!(enforcer.has_permission(&UserRole::Teacher, &SystemPermission::NotificationPublish));
        assert!(!enforcer.has_permission(&UserRole::Teacher, &SystemPermission::NotificationDelete));
    }

    #[test]
    fn test_minimum_role() {
        let enforcer = RbacEnforcer::new();
        assert!(enforcer
            .require_minimum_role(&UserRole::Admin, &UserRole::Teacher)
            .is_ok());
        assert!(enforcer
            .require_minimum_role(&UserRole::Parent, &UserRole::Teacher)
            .is_err());
    }
}
