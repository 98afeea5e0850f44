//! Notification category enumeration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Category of a notification for filtering in the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    /// Anything not covered below.
    General,
    /// Classes, exams, results.
    Academic,
    /// Credits, payments, fees.
    Finance,
    /// Document generation.
    Document,
    /// Library circulation.
    Library,
    /// Stock levels.
    Inventory,
    /// Platform messages.
    System,
}

impl NotificationCategory {
    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Academic => "academic",
            Self::Finance => "finance",
            Self::Document => "document",
            Self::Library => "library",
            Self::Inventory => "inventory",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = schoolhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "academic" => Ok(Self::Academic),
            "finance" => Ok(Self::Finance),
            "document" => Ok(Self::Document),
            "library" => Ok(Self::Library),
            "inventory" => Ok(Self::Inventory),
            "system" => Ok(Self::System),
            _ => Err(schoolhub_core::AppError::validation(format!(
                "Invalid notification category: '{s}'"
            ))),
        }
    }
}
