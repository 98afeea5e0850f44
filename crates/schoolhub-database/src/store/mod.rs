//! Store traits: the persistence seam between services and backends.
//!
//! Each trait is implemented twice: by a PostgreSQL repository in
//! [`crate::repositories`] and by [`crate::memory::MemoryStore`]. Both
//! implementations enforce the same invariants; in particular every ledger
//! write is all-or-nothing and a balance can never go negative.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::credit::{
    BalanceStatus, CreditBalance, CreditTransaction, LedgerMovement, NewPayment, TopUpOutcome,
    TransactionKind,
};
use schoolhub_entity::document::{
    DocumentTemplate, GeneratedDocument, NewDocument, NewTemplate, TemplateCategory,
};
use schoolhub_entity::inventory::{
    InventoryItem, NewInventoryItem, NewStockMovement, StockMovement,
};
use schoolhub_entity::library::{LibraryBook, NewBook};
use schoolhub_entity::notification::{NewNotification, Notification};
use schoolhub_entity::school::{NewStudent, NewTeacher, Student, Teacher};
use schoolhub_entity::user::{CreateUser, User, UserStatus, Viewer};

use crate::memory::MemoryStore;
use crate::repositories::{
    DocumentRepository, HealthRepository, InventoryRepository, LedgerRepository,
    LibraryRepository, NotificationRepository, RosterRepository, UserRepository,
};

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Insert a user and open their credit account in one unit.
    ///
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(
        &self,
        input: &CreateUser,
        initial_grant: i64,
    ) -> AppResult<(User, CreditBalance)>;

    /// Find a user by id.
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Change a user's status. Fails with `NotFound`.
    async fn set_user_status(&self, id: Uuid, status: UserStatus) -> AppResult<User>;

    /// List users, optionally restricted to one school.
    async fn list_users(
        &self,
        school_id: Option<Uuid>,
        page: PageRequest,
    ) -> AppResult<PageResponse<User>>;
}

/// Credit balances, the transaction log, and payments.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Create the balance row. Re-opening returns the existing row unchanged.
    async fn open_account(&self, user_id: Uuid, initial_grant: i64) -> AppResult<CreditBalance>;

    /// Fetch a balance.
    async fn find_balance(&self, user_id: Uuid) -> AppResult<Option<CreditBalance>>;

    /// Conditionally decrement `current_credits` and log a debit.
    ///
    /// Fails with `NotFound` (no balance), `Forbidden` (suspended) or
    /// `InsufficientCredits`; on failure nothing is written.
    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
        reference: Option<&str>,
    ) -> AppResult<LedgerMovement>;

    /// Increment `current_credits` and log a movement of `kind`
    /// (`Bonus` or `Refund`).
    ///
    /// A second refund with the same reference fails with `Conflict`.
    async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: TransactionKind,
        reason: &str,
        reference: Option<&str>,
    ) -> AppResult<LedgerMovement>;

    /// Record a payment and apply its credits, once per external id.
    async fn top_up(&self, payment: &NewPayment, reason: &str) -> AppResult<TopUpOutcome>;

    /// The refund logged under `reference`, if any.
    async fn find_refund(&self, reference: &str) -> AppResult<Option<CreditTransaction>>;

    /// A user's movements, newest first.
    async fn list_transactions(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<CreditTransaction>>;

    /// Sum of all logged amounts for a user.
    async fn transaction_sum(&self, user_id: Uuid) -> AppResult<i64>;

    /// Suspend or reactivate a balance. Fails with `NotFound`.
    async fn set_balance_status(
        &self,
        user_id: Uuid,
        status: BalanceStatus,
    ) -> AppResult<CreditBalance>;
}

/// Persisted notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Insert an unread notification.
    async fn insert_notification(&self, input: &NewNotification) -> AppResult<Notification>;

    /// Notifications visible to `viewer`, newest first.
    async fn list_for_viewer(
        &self,
        viewer: &Viewer,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Find a notification by id.
    async fn find_notification(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// Set the read flag. Fails with `NotFound`.
    async fn set_read(&self, id: Uuid, is_read: bool) -> AppResult<Notification>;

    /// Mark every notification visible to `viewer` read; returns how many changed.
    async fn mark_all_read(&self, viewer: &Viewer) -> AppResult<u64>;

    /// Unread notifications visible to `viewer`.
    async fn count_unread(&self, viewer: &Viewer) -> AppResult<i64>;

    /// Delete one notification; `false` when it did not exist.
    async fn delete_notification(&self, id: Uuid) -> AppResult<bool>;

    /// Delete notifications created before `before`; returns how many.
    async fn prune_before(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Templates and generated documents.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Insert a template.
    async fn create_template(&self, input: &NewTemplate) -> AppResult<DocumentTemplate>;

    /// Find a template by id.
    async fn find_template(&self, id: Uuid) -> AppResult<Option<DocumentTemplate>>;

    /// List templates, optionally by category.
    async fn list_templates(
        &self,
        category: Option<TemplateCategory>,
        include_inactive: bool,
    ) -> AppResult<Vec<DocumentTemplate>>;

    /// Debit the document's cost and insert it as `pending`, atomically.
    ///
    /// With `InsufficientCredits` neither the balance nor the documents
    /// table changes.
    async fn begin_generation(
        &self,
        input: &NewDocument,
    ) -> AppResult<(GeneratedDocument, Option<LedgerMovement>)>;

    /// `pending -> completed`, bumping the template's usage counter.
    ///
    /// Fails with `Conflict` when the document is no longer pending.
    async fn complete_generation(
        &self,
        id: Uuid,
        file_path: &str,
        file_url: &str,
    ) -> AppResult<GeneratedDocument>;

    /// `pending -> failed` with an error message.
    async fn fail_generation(&self, id: Uuid, error: &str) -> AppResult<GeneratedDocument>;

    /// Record the compensating refund on a failed document. Keeps an
    /// already-recorded refund.
    async fn attach_refund(&self, id: Uuid, refund_transaction_id: Uuid)
    -> AppResult<GeneratedDocument>;

    /// Find a document by id.
    async fn find_document(&self, id: Uuid) -> AppResult<Option<GeneratedDocument>>;

    /// A user's documents, newest first.
    async fn list_documents(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<GeneratedDocument>>;

    /// Failed documents still owed a refund, oldest first.
    async fn list_unrefunded_failures(&self, limit: i64) -> AppResult<Vec<GeneratedDocument>>;

    /// Documents pending since before `older_than`, oldest first.
    async fn list_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<GeneratedDocument>>;

    /// Completed documents requested by members of a school.
    async fn count_completed_for_school(&self, school_id: Uuid) -> AppResult<i64>;
}

/// Student list filter.
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    /// School to list.
    pub school_id: Uuid,
    /// Substring of name or code.
    pub search: Option<String>,
    /// Exact class name.
    pub class_name: Option<String>,
}

/// Students and teachers.
#[async_trait]
pub trait RosterStore: Send + Sync + 'static {
    /// Enrol a student. Fails with `Conflict` on a duplicate code.
    async fn create_student(&self, input: &NewStudent) -> AppResult<Student>;

    /// List active students.
    async fn list_students(
        &self,
        query: &StudentQuery,
        page: PageRequest,
    ) -> AppResult<PageResponse<Student>>;

    /// Active students in a school.
    async fn count_students(&self, school_id: Uuid) -> AppResult<i64>;

    /// Add a teacher. Fails with `Conflict` on a duplicate code.
    async fn create_teacher(&self, input: &NewTeacher) -> AppResult<Teacher>;

    /// List active teachers.
    async fn list_teachers(
        &self,
        school_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<Teacher>>;

    /// Active teachers in a school.
    async fn count_teachers(&self, school_id: Uuid) -> AppResult<i64>;
}

/// Library list filter.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// School to list.
    pub school_id: Uuid,
    /// Substring of title, author or ISBN.
    pub search: Option<String>,
    /// Exact category.
    pub category: Option<String>,
}

/// Copy counts for a school's library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct BookTotals {
    /// Copies owned.
    pub total: i64,
    /// Copies on the shelf.
    pub available: i64,
}

/// The library catalogue.
#[async_trait]
pub trait LibraryStore: Send + Sync + 'static {
    /// Catalogue a book.
    async fn create_book(&self, input: &NewBook) -> AppResult<LibraryBook>;

    /// List books, ordered by title.
    async fn list_books(
        &self,
        query: &BookQuery,
        page: PageRequest,
    ) -> AppResult<PageResponse<LibraryBook>>;

    /// Copy counts for a school.
    async fn book_totals(&self, school_id: Uuid) -> AppResult<BookTotals>;
}

/// Inventory items and the movement log.
#[async_trait]
pub trait InventoryStore: Send + Sync + 'static {
    /// Add an item.
    async fn create_item(&self, input: &NewInventoryItem) -> AppResult<InventoryItem>;

    /// Find an item by id.
    async fn find_item(&self, id: Uuid) -> AppResult<Option<InventoryItem>>;

    /// List items, ordered by name.
    async fn list_items(
        &self,
        school_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<InventoryItem>>;

    /// Apply a signed stock change and log it, atomically.
    ///
    /// Fails with `Validation` when the change would make stock negative.
    async fn record_movement(
        &self,
        input: &NewStockMovement,
    ) -> AppResult<(InventoryItem, StockMovement)>;

    /// An item's movements, newest first.
    async fn list_movements(
        &self,
        item_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<StockMovement>>;

    /// Items at or below their reorder level.
    async fn count_low_stock(&self, school_id: Uuid) -> AppResult<i64>;
}

/// Backend liveness.
#[async_trait]
pub trait HealthStore: Send + Sync + 'static {
    /// Round-trip to the backend.
    async fn ping(&self) -> AppResult<()>;

    /// Backend name for the health endpoint.
    fn backend(&self) -> &'static str;
}

/// Every store the services need, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    /// User accounts.
    pub users: Arc<dyn UserStore>,
    /// Credit ledger.
    pub ledger: Arc<dyn LedgerStore>,
    /// Notifications.
    pub notifications: Arc<dyn NotificationStore>,
    /// Templates and documents.
    pub documents: Arc<dyn DocumentStore>,
    /// Students and teachers.
    pub roster: Arc<dyn RosterStore>,
    /// Library.
    pub library: Arc<dyn LibraryStore>,
    /// Inventory.
    pub inventory: Arc<dyn InventoryStore>,
    /// Liveness.
    pub health: Arc<dyn HealthStore>,
}

impl Stores {
    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            ledger: Arc::new(LedgerRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            documents: Arc::new(DocumentRepository::new(pool.clone())),
            roster: Arc::new(RosterRepository::new(pool.clone())),
            library: Arc::new(LibraryRepository::new(pool.clone())),
            inventory: Arc::new(InventoryRepository::new(pool.clone())),
            health: Arc::new(HealthRepository::new(pool)),
        }
    }

    /// A fresh in-memory backend.
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Every store backed by the same in-memory state.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            ledger: store.clone(),
            notifications: store.clone(),
            documents: store.clone(),
            roster: store.clone(),
            library: store.clone(),
            inventory: store.clone(),
            health: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("backend", &self.health.backend())
            .finish()
    }
}
