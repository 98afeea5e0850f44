//! The identity a request acts as.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::UserRole;

/// Who is looking: the authenticated user's id, role and school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    /// The user's id.
    pub user_id: Uuid,
    /// The user's role.
    pub role: UserRole,
    /// The user's school, if any.
    pub school_id: Option<Uuid>,
}

impl Viewer {
    /// Whether this viewer may read data belonging to `school_id`.
    ///
    /// Admins without a school are platform admins and see every school.
    pub fn can_access_school(&self, school_id: Uuid) -> bool {
        match self.school_id {
            Some(own) => own == school_id,
            None => self.role.is_admin(),
        }
    }
}
