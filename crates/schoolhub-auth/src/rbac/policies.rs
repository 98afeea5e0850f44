//! Role-to-permission mapping definitions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use schoolhub_entity::user::UserRole;

/// A school-level operation a role may or may not perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemPermission {
    // Users
    /// Create users and open their credit accounts.
    UserCreate,
    /// Soft-deactivate users.
    UserDeactivate,

    // Credits
    /// Read another user's balance and history.
    CreditViewAny,
    /// Grant bonus credits.
    CreditGrant,
    /// Suspend or reactivate a balance.
    CreditManage,
    /// Spend own credits.
    CreditSpend,

    // Notifications
    /// Publish notifications to others.
    NotificationPublish,
    /// Delete notifications.
    NotificationDelete,

    // Documents
    /// Generate documents from templates.
    DocumentGenerate,
    /// Create and edit templates.
    TemplateManage,

    // School records
    /// Read students, teachers, books and inventory.
    RecordsView,
    /// Create and modify school records.
    RecordsManage,
    /// View dashboard statistics.
    DashboardView,
}

/// Defines the mapping from each role to its set of allowed permissions.
#[derive(Debug, Clone)]
pub struct RbacPolicies {
    /// Role → set of permissions.
    policies: HashMap<UserRole, HashSet<SystemPermission>>,
}

impl RbacPolicies {
    /// Creates the default policy set.
    pub fn new() -> Self {
        use SystemPermission::*;

        let mut policies = HashMap::new();

        // Parents and students spend credits on their own documents
        let member: HashSet<_> = [CreditSpend, DocumentGenerate].into_iter().collect();
        policies.insert(UserRole::Parent, member.clone());
        policies.insert(UserRole::Student, member.clone());

        let mut teacher = member;
        teacher.extend([
            NotificationPublish,
            RecordsView,
            RecordsManage,
            DashboardView,
        ]);
        policies.insert(UserRole::Teacher, teacher.clone());

        let mut admin = teacher;
        admin.extend([
            UserCreate,
            UserDeactivate,
            CreditViewAny,
            CreditGrant,
            CreditManage,
            NotificationDelete,
            TemplateManage,
        ]);
        policies.insert(UserRole::Admin, admin);

        Self { policies }
    }

    /// Whether `role` holds `permission`.
    pub fn has_permission(&self, role: &UserRole, permission: &SystemPermission) -> bool {
        self.policies
            .get(role)
            .is_some_and(|set| set.contains(permission))
    }

    /// All permissions held by `role`.
    pub fn permissions_for(&self, role: &UserRole) -> Vec<SystemPermission> {
        self.policies
            .get(role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for RbacPolicies {
    fn default() -> Self {
        Self::new()
    }
}
