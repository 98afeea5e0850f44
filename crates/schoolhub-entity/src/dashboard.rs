//! School dashboard figures.

use serde::{Deserialize, Serialize};

/// Headline counts for one school's dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Active students.
    pub total_students: i64,
    /// Active teachers.
    pub total_teachers: i64,
    /// Catalogued copies.
    pub total_books: i64,
    /// Copies on the shelf.
    pub available_books: i64,
    /// Items at or below their reorder level.
    pub low_stock_items: i64,
    /// Completed documents generated by the school's users.
    pub generated_documents: i64,
}
