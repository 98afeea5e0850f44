//! Student record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Unique record identifier.
    pub id: Uuid,
    /// Owning school.
    pub school_id: Uuid,
    /// Linked login, if the student has one.
    pub user_id: Option<Uuid>,
    /// School-assigned student code, unique per school.
    pub student_code: String,
    /// Full name.
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Class, e.g. `Eight`.
    pub class_name: String,
    /// Section within the class.
    pub section: Option<String>,
    /// Roll number within the section.
    pub roll_number: Option<i32>,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Guardian's name.
    pub guardian_name: Option<String>,
    /// Guardian's phone.
    pub guardian_phone: Option<String>,
    /// Whether the student is currently enrolled.
    pub is_active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to enrol a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    /// Owning school.
    pub school_id: Uuid,
    /// Linked login.
    pub user_id: Option<Uuid>,
    /// Student code.
    pub student_code: String,
    /// Full name.
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Class.
    pub class_name: String,
    /// Section.
    pub section: Option<String>,
    /// Roll number.
    pub roll_number: Option<i32>,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Guardian's name.
    pub guardian_name: Option<String>,
    /// Guardian's phone.
    pub guardian_phone: Option<String>,
}

impl NewStudent {
    /// Materialize the row this input produces.
    pub fn into_student(self, id: Uuid, now: DateTime<Utc>) -> Student {
        Student {
            id,
            school_id: self.school_id,
            user_id: self.user_id,
            student_code: self.student_code,
            full_name: self.full_name,
            full_name_bn: self.full_name_bn,
            class_name: self.class_name,
            section: self.section,
            roll_number: self.roll_number,
            date_of_birth: self.date_of_birth,
            guardian_name: self.guardian_name,
            guardian_phone: self.guardian_phone,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Student {
    /// Case-insensitive match on name, Bengali name, or code.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.full_name.to_lowercase().contains(&needle)
            || self.student_code.to_lowercase().contains(&needle)
            || self
                .full_name_bn
                .as_deref()
                .is_some_and(|n| n.contains(&needle))
    }
}
