//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;
use super::status::UserStatus;
use super::viewer::Viewer;

/// A registered member of a school.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier (matches the auth provider's subject).
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Full name.
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Role within the school.
    pub role: UserRole,
    /// The school this user belongs to.
    pub school_id: Option<Uuid>,
    /// Account status.
    pub status: UserStatus,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the user can authenticate right now.
    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// The scope this user sees shared resources through.
    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.id,
            role: self.role,
            school_id: self.school_id,
        }
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    /// Explicit identifier; generated when absent.
    pub id: Option<Uuid>,
    /// Email address.
    pub email: String,
    /// Full name.
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Assigned role.
    pub role: UserRole,
    /// School membership.
    pub school_id: Option<Uuid>,
}
