//! Library book entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A catalogued title. `available_copies` never exceeds `total_copies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LibraryBook {
    /// Unique book identifier.
    pub id: Uuid,
    /// Owning school.
    pub school_id: Uuid,
    /// Title.
    pub title: String,
    /// Title in Bengali.
    pub title_bn: Option<String>,
    /// Author.
    pub author: Option<String>,
    /// ISBN.
    pub isbn: Option<String>,
    /// Free-form category, e.g. `fiction`.
    pub category: Option<String>,
    /// Copies owned.
    pub total_copies: i32,
    /// Copies on the shelf.
    pub available_copies: i32,
    /// Shelf location.
    pub shelf_location: Option<String>,
    /// When the book was catalogued.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl LibraryBook {
    /// Copies currently lent out.
    pub fn borrowed_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    /// Case-insensitive match on title, Bengali title, author or ISBN.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.title_bn.as_deref().is_some_and(|t| t.contains(&needle))
            || self
                .author
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(&needle))
            || self.isbn.as_deref().is_some_and(|i| i.contains(&needle))
    }
}

/// Data required to catalogue a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    /// Owning school.
    pub school_id: Uuid,
    /// Title.
    pub title: String,
    /// Title in Bengali.
    pub title_bn: Option<String>,
    /// Author.
    pub author: Option<String>,
    /// ISBN.
    pub isbn: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Copies owned.
    pub total_copies: i32,
    /// Copies on the shelf; defaults to `total_copies`.
    pub available_copies: Option<i32>,
    /// Shelf location.
    pub shelf_location: Option<String>,
}

impl NewBook {
    /// Materialize the row this input produces.
    pub fn into_book(self, id: Uuid, now: DateTime<Utc>) -> LibraryBook {
        LibraryBook {
            id,
            school_id: self.school_id,
            title: self.title,
            title_bn: self.title_bn,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            total_copies: self.total_copies,
            available_copies: self.available_copies.unwrap_or(self.total_copies),
            shelf_location: self.shelf_location,
            created_at: now,
            updated_at: now,
        }
    }
}
