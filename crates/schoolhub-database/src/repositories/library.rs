//! Library catalogue repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::library::{LibraryBook, NewBook};

use super::like_pattern;
use crate::error::db_err;
use crate::store::{BookQuery, BookTotals, LibraryStore};

/// Repository for `library_books`.
#[derive(Debug, Clone)]
pub struct LibraryRepository {
    pool: PgPool,
}

impl LibraryRepository {
    /// Create a new library repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOK_FILTER: &str = "school_id = $1 \
     AND ($2::text IS NULL OR title ILIKE $2 OR title_bn ILIKE $2 OR author ILIKE $2 OR isbn ILIKE $2) \
     AND ($3::text IS NULL OR category = $3)";

#[async_trait]
impl LibraryStore for LibraryRepository {
    async fn create_book(&self, input: &NewBook) -> AppResult<LibraryBook> {
        let available = input.available_copies.unwrap_or(input.total_copies);
        if available < 0 || available > input.total_copies {
            return Err(AppError::validation(
                "availableCopies must be between 0 and totalCopies",
            ));
        }
        sqlx::query_as::<_, LibraryBook>(
            "INSERT INTO library_books \
             (id, school_id, title, title_bn, author, isbn, category, total_copies, \
              available_copies, shelf_location) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.school_id)
        .bind(&input.title)
        .bind(&input.title_bn)
        .bind(&input.author)
        .bind(&input.isbn)
        .bind(&input.category)
        .bind(input.total_copies)
        .bind(available)
        .bind(&input.shelf_location)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create book"))
    }

    async fn list_books(
        &self,
        query: &BookQuery,
        page: PageRequest,
    ) -> AppResult<PageResponse<LibraryBook>> {
        let search = query.search.as_deref().map(like_pattern);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM library_books WHERE {BOOK_FILTER}"))
                .bind(query.school_id)
                .bind(&search)
                .bind(&query.category)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("Failed to count books"))?;

        let items = sqlx::query_as::<_, LibraryBook>(&format!(
            "SELECT * FROM library_books WHERE {BOOK_FILTER} ORDER BY title LIMIT $4 OFFSET $5"
        ))
        .bind(query.school_id)
        .bind(&search)
        .bind(&query.category)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list books"))?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn book_totals(&self, school_id: Uuid) -> AppResult<BookTotals> {
        sqlx::query_as::<_, BookTotals>(
            "SELECT COALESCE(SUM(total_copies), 0)::BIGINT AS total, \
                    COALESCE(SUM(available_copies), 0)::BIGINT AS available \
             FROM library_books WHERE school_id = $1",
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to total library copies"))
    }
}
