//! Teacher record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A member of teaching staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    /// Unique record identifier.
    pub id: Uuid,
    /// Owning school.
    pub school_id: Uuid,
    /// Linked login, if any.
    pub user_id: Option<Uuid>,
    /// Employee code, unique per school.
    pub employee_code: String,
    /// Full name.
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Designation, e.g. `Assistant Teacher`.
    pub designation: Option<String>,
    /// Main subject.
    pub subject: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Whether the teacher is currently employed.
    pub is_active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to add a teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    /// Owning school.
    pub school_id: Uuid,
    /// Linked login.
    pub user_id: Option<Uuid>,
    /// Employee code.
    pub employee_code: String,
    /// Full name.
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Designation.
    pub designation: Option<String>,
    /// Main subject.
    pub subject: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Email address.
    pub email: Option<String>,
}

impl NewTeacher {
    /// Materialize the row this input produces.
    pub fn into_teacher(self, id: Uuid, now: DateTime<Utc>) -> Teacher {
        Teacher {
            id,
            school_id: self.school_id,
            user_id: self.user_id,
            employee_code: self.employee_code,
            full_name: self.full_name,
            full_name_bn: self.full_name_bn,
            designation: self.designation,
            subject: self.subject,
            phone: self.phone,
            email: self.email,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
