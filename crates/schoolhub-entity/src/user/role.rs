//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles a school member can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// School or platform administrator.
    Admin,
    /// Teaching staff.
    Teacher,
    /// Enrolled student.
    Student,
    /// Parent or guardian of a student.
    Parent,
}

impl UserRole {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role may publish notifications to others.
    pub fn can_publish_notifications(&self) -> bool {
        matches!(self, Self::Admin | Self::Teacher)
    }

    /// Whether this role may create student, teacher, library and
    /// inventory records.
    pub fn can_manage_records(&self) -> bool {
        matches!(self, Self::Admin | Self::Teacher)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Parent => "parent",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = schoolhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            "parent" => Ok(Self::Parent),
            _ => Err(schoolhub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, teacher, student, parent"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("PARENT".parse::<UserRole>().unwrap(), UserRole::Parent);
        assert!("manager".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_publish_rights() {
        assert!(UserRole::Teacher.can_publish_notifications());
        assert!(!UserRole::Student.can_publish_notifications());
    }
}
