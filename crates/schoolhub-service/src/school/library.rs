//! Library catalogue.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_database::store::{BookQuery, LibraryStore};
use schoolhub_entity::library::{LibraryBook, NewBook};

use crate::context::RequestContext;

/// Manages a school's library books.
#[derive(Clone)]
pub struct LibraryService {
    library: Arc<dyn LibraryStore>,
}

impl std::fmt::Debug for LibraryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryService").finish_non_exhaustive()
    }
}

impl LibraryService {
    /// Creates a new library service.
    pub fn new(library: Arc<dyn LibraryStore>) -> Self {
        Self { library }
    }

    /// Books of a school, filtered by search text and category.
    pub async fn list_books(
        &self,
        ctx: &RequestContext,
        school_id: Option<Uuid>,
        search: Option<String>,
        category: Option<String>,
        page: PageRequest,
    ) -> Result<PageResponse<LibraryBook>, AppError> {
        ctx.require(SystemPermission::RecordsView)?;
        let query = BookQuery {
            school_id: ctx.resolve_school(school_id)?,
            search: search.filter(|s| !s.trim().is_empty()),
            category: category.filter(|s| !s.trim().is_empty()),
        };
        self.library.list_books(&query, page.normalized()).await
    }

    /// Catalogue a book.
    pub async fn create_book(
        &self,
        ctx: &RequestContext,
        input: NewBook,
    ) -> Result<LibraryBook, AppError> {
        ctx.require(SystemPermission::RecordsManage)?;
        ctx.require_school(input.school_id)?;
        if input.title.trim().is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if input.total_copies < 0 {
            return Err(AppError::validation("totalCopies must not be negative"));
        }
        let book = self.library.create_book(&input).await?;
        info!(book_id = %book.id, copies = book.total_copies, "Book catalogued");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_core::ErrorKind;
    use schoolhub_database::MemoryStore;
    use schoolhub_entity::user::UserRole;

    fn book(school: Uuid, total: i32, available: Option<i32>) -> NewBook {
        NewBook {
            school_id: school,
            title: "Gitanjali".into(),
            title_bn: Some("গীতাঞ্জলি".into()),
            author: Some("Rabindranath Tagore".into()),
            isbn: None,
            category: Some("poetry".into()),
            total_copies: total,
            available_copies: available,
            shelf_location: None,
        }
    }

    #[tokio::test]
    async fn test_available_copies_cannot_exceed_total() {
        let svc = LibraryService::new(Arc::new(MemoryStore::new()));
        let school = Uuid::new_v4();
        let teacher = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, Some(school));

        let err = svc
            .create_book(&teacher, book(school, 2, Some(3)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let created = svc.create_book(&teacher, book(school, 3, None)).await.unwrap();
        assert_eq!(created.available_copies, 3);
    }

    #[tokio::test]
    async fn test_filter_by_category() {
        let svc = LibraryService::new(Arc::new(MemoryStore::new()));
        let school = Uuid::new_v4();
        let teacher = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, Some(school));
        svc.create_book(&teacher, book(school, 1, None)).await.unwrap();

        let poetry = svc
            .list_books(&teacher, None, None, Some("poetry".into()), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(poetry.total_items, 1);
        let science = svc
            .list_books(&teacher, None, None, Some("science".into()), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(science.total_items, 0);
    }
}
