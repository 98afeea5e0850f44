//! School dashboard statistics.
//!
//! Each figure is an independent query. A figure whose query fails with a
//! control-plane error reads as zero; any other failure fails the request.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::error::AppError;
use schoolhub_database::store::{
    BookTotals, DocumentStore, InventoryStore, LibraryStore, RosterStore,
};
use schoolhub_entity::dashboard::DashboardStats;

use crate::context::RequestContext;

/// Computes dashboard figures for a school.
#[derive(Clone)]
pub struct DashboardService {
    roster: Arc<dyn RosterStore>,
    library: Arc<dyn LibraryStore>,
    inventory: Arc<dyn InventoryStore>,
    documents: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardService").finish_non_exhaustive()
    }
}

/// Downgrade a control-plane failure to `fallback`.
fn degrade<T>(figure: &str, school_id: Uuid, result: Result<T, AppError>, fallback: T) -> Result<T, AppError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_control_plane() => {
            warn!(figure, school_id = %school_id, error = %e, "Dashboard figure unavailable, reporting zero");
            Ok(fallback)
        }
        Err(e) => Err(e),
    }
}

impl DashboardService {
    /// Creates a new dashboard service.
    pub fn new(
        roster: Arc<dyn RosterStore>,
        library: Arc<dyn LibraryStore>,
        inventory: Arc<dyn InventoryStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            roster,
            library,
            inventory,
            documents,
        }
    }

    /// Headline figures for `school_id` (defaults to the caller's school).
    pub async fn stats(
        &self,
        ctx: &RequestContext,
        school_id: Option<Uuid>,
    ) -> Result<DashboardStats, AppError> {
        ctx.require(SystemPermission::DashboardView)?;
        let school_id = ctx.resolve_school(school_id)?;

        let (students, teachers, books, low_stock, documents) = tokio::join!(
            self.roster.count_students(school_id),
            self.roster.count_teachers(school_id),
            self.library.book_totals(school_id),
            self.inventory.count_low_stock(school_id),
            self.documents.count_completed_for_school(school_id),
        );
        let books = degrade("books", school_id, books, BookTotals::default())?;

        Ok(DashboardStats {
            total_students: degrade("students", school_id, students, 0)?,
            total_teachers: degrade("teachers", school_id, teachers, 0)?,
            total_books: books.total,
            available_books: books.available,
            low_stock_items: degrade("low_stock_items", school_id, low_stock, 0)?,
            generated_documents: degrade("generated_documents", school_id, documents, 0)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use schoolhub_core::error::ErrorKind;
    use schoolhub_core::result::AppResult;
    use schoolhub_core::types::pagination::{PageRequest, PageResponse};
    use schoolhub_database::MemoryStore;
    use schoolhub_database::store::StudentQuery;
    use schoolhub_entity::school::{NewStudent, NewTeacher, Student, Teacher};
    use schoolhub_entity::user::UserRole;

    /// A roster whose every call fails with the given kind.
    struct BrokenRoster(ErrorKind);

    impl BrokenRoster {
        fn fail<T>(&self) -> AppResult<T> {
            Err(AppError::new(self.0, "connection reset by control plane"))
        }
    }

    #[async_trait]
    impl RosterStore for BrokenRoster {
        async fn create_student(&self, _: &NewStudent) -> AppResult<Student> {
            self.fail()
        }
        async fn list_students(&self, _: &StudentQuery, _: PageRequest) -> AppResult<PageResponse<Student>> {
            self.fail()
        }
        async fn count_students(&self, _: Uuid) -> AppResult<i64> {
            self.fail()
        }
        async fn create_teacher(&self, _: &NewTeacher) -> AppResult<Teacher> {
            self.fail()
        }
        async fn list_teachers(&self, _: Uuid, _: PageRequest) -> AppResult<PageResponse<Teacher>> {
            self.fail()
        }
        async fn count_teachers(&self, _: Uuid) -> AppResult<i64> {
            self.fail()
        }
    }

    fn service(roster: Arc<dyn RosterStore>, store: Arc<MemoryStore>) -> DashboardService {
        DashboardService::new(roster, store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn test_counts_from_store() {
        let store = Arc::new(MemoryStore::new());
        let school = Uuid::new_v4();
        store
            .create_student(&NewStudent {
                school_id: school,
                user_id: None,
                student_code: "S-1".into(),
                full_name: "Rahim".into(),
                full_name_bn: None,
                class_name: "Five".into(),
                section: None,
                roll_number: Some(1),
                date_of_birth: None,
                guardian_name: None,
                guardian_phone: None,
            })
            .await
            .unwrap();
        let ctx = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, Some(school));
        let stats = service(store.clone(), store).stats(&ctx, None).await.unwrap();
        assert_eq!(stats.total_students, 1);
        assert_eq!(stats.total_teachers, 0);
    }

    #[tokio::test]
    async fn test_control_plane_failure_reads_as_zero() {
        let store = Arc::new(MemoryStore::new());
        let ctx = RequestContext::new(Uuid::new_v4(), UserRole::Admin, Some(Uuid::new_v4()));
        let stats = service(Arc::new(BrokenRoster(ErrorKind::ControlPlane)), store)
            .stats(&ctx, None)
            .await
            .unwrap();
        assert_eq!(stats, DashboardStats::default());
    }

    #[tokio::test]
    async fn test_other_failures_surface() {
        let store = Arc::new(MemoryStore::new());
        let ctx = RequestContext::new(Uuid::new_v4(), UserRole::Admin, Some(Uuid::new_v4()));
        let err = service(Arc::new(BrokenRoster(ErrorKind::UpstreamService)), store)
            .stats(&ctx, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamService);
    }

    #[tokio::test]
    async fn test_students_cannot_view_dashboard() {
        let store = Arc::new(MemoryStore::new());
        let ctx = RequestContext::new(Uuid::new_v4(), UserRole::Student, Some(Uuid::new_v4()));
        let err = service(store.clone(), store).stats(&ctx, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }
}
