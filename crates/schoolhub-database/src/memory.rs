//! In-memory implementation of every store trait.
//!
//! All state sits behind one mutex, so each trait method is atomic in the
//! same way a single database transaction is. Used by tests and by
//! `--memory` development runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::credit::{
    BalanceStatus, CreditBalance, CreditPayment, CreditTransaction, LedgerMovement, NewPayment,
    TopUpOutcome, TransactionKind,
};
use schoolhub_entity::document::{
    DocumentStatus, DocumentTemplate, GeneratedDocument, NewDocument, NewTemplate,
    TemplateCategory,
};
use schoolhub_entity::inventory::{
    InventoryItem, NewInventoryItem, NewStockMovement, StockMovement,
};
use schoolhub_entity::library::{LibraryBook, NewBook};
use schoolhub_entity::notification::{NewNotification, Notification};
use schoolhub_entity::school::{NewStudent, NewTeacher, Student, Teacher};
use schoolhub_entity::user::{CreateUser, User, UserStatus, Viewer};

use crate::store::{
    BookQuery, BookTotals, DocumentStore, HealthStore, InventoryStore, LedgerStore,
    LibraryStore, NotificationStore, RosterStore, StudentQuery, UserStore,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    balances: HashMap<Uuid, CreditBalance>,
    transactions: Vec<CreditTransaction>,
    payments: Vec<CreditPayment>,
    notifications: Vec<Notification>,
    templates: HashMap<Uuid, DocumentTemplate>,
    documents: HashMap<Uuid, GeneratedDocument>,
    students: Vec<Student>,
    teachers: Vec<Teacher>,
    books: Vec<LibraryBook>,
    items: HashMap<Uuid, InventoryItem>,
    movements: Vec<StockMovement>,
}

impl State {
    fn debit(
        &mut self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
        reference: Option<&str>,
    ) -> AppResult<LedgerMovement> {
        let balance = self
            .balances
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("No credit balance for user {user_id}")))?;
        if balance.status == BalanceStatus::Suspended {
            return Err(AppError::forbidden(format!(
                "Credit balance for user {user_id} is suspended"
            )));
        }
        if balance.current_credits < amount {
            return Err(AppError::insufficient_credits(
                amount,
                balance.current_credits,
            ));
        }
        balance.current_credits -= amount;
        balance.used_credits += amount;
        balance.updated_at = Utc::now();
        let balance = balance.clone();

        let transaction = self.append(
            user_id,
            -amount,
            TransactionKind::Debit,
            reason,
            reference,
            balance.current_credits,
        );
        Ok(LedgerMovement {
            transaction,
            balance,
        })
    }

    fn credit(
        &mut self,
        user_id: Uuid,
        amount: i64,
        kind: TransactionKind,
        reason: &str,
        reference: Option<&str>,
    ) -> AppResult<LedgerMovement> {
        if kind == TransactionKind::Refund
            && reference.is_some_and(|r| self.refund_for(r).is_some())
        {
            return Err(AppError::conflict(format!(
                "Refund already recorded for {}",
                reference.unwrap_or_default()
            )));
        }
        let balance = self
            .balances
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("No credit balance for user {user_id}")))?;
        let overflow =
            || AppError::validation(format!("Crediting {amount} would overflow the balance"));
        let current = balance
            .current_credits
            .checked_add(amount)
            .ok_or_else(overflow)?;
        let bonus = match kind {
            TransactionKind::Bonus => balance
                .bonus_credits
                .checked_add(amount)
                .ok_or_else(overflow)?,
            _ => balance.bonus_credits,
        };
        balance.current_credits = current;
        balance.bonus_credits = bonus;
        match kind {
            TransactionKind::Refund => {
                balance.used_credits = (balance.used_credits - amount).max(0);
            }
            TransactionKind::Bonus | TransactionKind::Debit | TransactionKind::TopUp => {}
        }
        balance.updated_at = Utc::now();
        let balance = balance.clone();

        let transaction = self.append(
            user_id,
            amount,
            kind,
            reason,
            reference,
            balance.current_credits,
        );
        Ok(LedgerMovement {
            transaction,
            balance,
        })
    }

    fn append(
        &mut self,
        user_id: Uuid,
        amount: i64,
        kind: TransactionKind,
        reason: &str,
        reference: Option<&str>,
        balance_after: i64,
    ) -> CreditTransaction {
        let transaction = CreditTransaction {
            id: Uuid::now_v7(),
            user_id,
            amount,
            kind,
            reason: reason.to_string(),
            reference: reference.map(str::to_string),
            balance_after,
            created_at: Utc::now(),
        };
        self.transactions.push(transaction.clone());
        transaction
    }

    fn refund_for(&self, reference: &str) -> Option<&CreditTransaction> {
        self.transactions
            .iter()
            .find(|t| t.kind == TransactionKind::Refund && t.reference.as_deref() == Some(reference))
    }

    fn transition(
        &mut self,
        id: Uuid,
        next: DocumentStatus,
    ) -> AppResult<&mut GeneratedDocument> {
        let document = self
            .documents
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;
        if !document.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Document {id} cannot move from {} to {next}",
                document.status
            )));
        }
        document.status = next;
        document.completed_at = Some(Utc::now());
        Ok(document)
    }
}

/// Newest-first page over an already filtered list.
fn paginate<T: Clone>(mut items: Vec<T>, page: PageRequest) -> PageResponse<T> {
    let total = items.len() as i64;
    let start = (page.offset().max(0) as usize).min(items.len());
    let end = (start + page.limit().max(0) as usize).min(items.len());
    let slice = items.drain(start..end).collect();
    PageResponse::new(slice, page, total)
}

/// Process-local store backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdate a document, for exercising the stale-pending reconciler.
    pub async fn set_document_created_at(&self, id: Uuid, created_at: DateTime<Utc>) {
        if let Some(doc) = self.state.lock().await.documents.get_mut(&id) {
            doc.created_at = created_at;
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        input: &CreateUser,
        initial_grant: i64,
    ) -> AppResult<(User, CreditBalance)> {
        let mut state = self.state.lock().await;
        let email = input.email.trim().to_lowercase();
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::conflict(format!("Email {email} is already registered")));
        }
        let id = input.id.unwrap_or_else(Uuid::now_v7);
        if state.users.contains_key(&id) {
            return Err(AppError::conflict(format!("User {id} already exists")));
        }
        let now = Utc::now();
        let user = User {
            id,
            email,
            full_name: input.full_name.clone(),
            full_name_bn: input.full_name_bn.clone(),
            role: input.role,
            school_id: input.school_id,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let balance = state
            .balances
            .entry(id)
            .or_insert_with(|| CreditBalance::opened(id, initial_grant))
            .clone();
        state.users.insert(id, user.clone());
        Ok((user, balance))
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_user_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.status = status;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list_users(
        &self,
        school_id: Option<Uuid>,
        page: PageRequest,
    ) -> AppResult<PageResponse<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| school_id.is_none() || u.school_id == school_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(users, page))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn open_account(&self, user_id: Uuid, initial_grant: i64) -> AppResult<CreditBalance> {
        let mut state = self.state.lock().await;
        Ok(state
            .balances
            .entry(user_id)
            .or_insert_with(|| CreditBalance::opened(user_id, initial_grant))
            .clone())
    }

    async fn find_balance(&self, user_id: Uuid) -> AppResult<Option<CreditBalance>> {
        Ok(self.state.lock().await.balances.get(&user_id).cloned())
    }

    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
        reference: Option<&str>,
    ) -> AppResult<LedgerMovement> {
        self.state
            .lock()
            .await
            .debit(user_id, amount, reason, reference)
    }

    async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: TransactionKind,
        reason: &str,
        reference: Option<&str>,
    ) -> AppResult<LedgerMovement> {
        self.state
            .lock()
            .await
            .credit(user_id, amount, kind, reason, reference)
    }

    async fn top_up(&self, payment: &NewPayment, reason: &str) -> AppResult<TopUpOutcome> {
        let mut state = self.state.lock().await;
        if let Some(original) = state
            .payments
            .iter()
            .find(|p| p.external_transaction_id == payment.external_transaction_id)
        {
            return payment.replay(original.clone());
        }
        let movement = state.credit(
            payment.user_id,
            payment.credits,
            TransactionKind::TopUp,
            reason,
            Some(&payment.external_transaction_id),
        )?;
        let recorded = CreditPayment {
            id: Uuid::now_v7(),
            user_id: payment.user_id,
            amount: payment.amount,
            currency: payment.currency.clone(),
            method: payment.method,
            external_transaction_id: payment.external_transaction_id.clone(),
            credits_awarded: payment.credits,
            transaction_id: Some(movement.transaction.id),
            created_at: Utc::now(),
        };
        state.payments.push(recorded.clone());
        Ok(TopUpOutcome::Credited {
            payment: recorded,
            movement,
        })
    }

    async fn find_refund(&self, reference: &str) -> AppResult<Option<CreditTransaction>> {
        Ok(self.state.lock().await.refund_for(reference).cloned())
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<CreditTransaction>> {
        let state = self.state.lock().await;
        let items: Vec<CreditTransaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }

    async fn transaction_sum(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .state
            .lock()
            .await
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.amount)
            .sum())
    }

    async fn set_balance_status(
        &self,
        user_id: Uuid,
        status: BalanceStatus,
    ) -> AppResult<CreditBalance> {
        let mut state = self.state.lock().await;
        let balance = state
            .balances
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("No credit balance for user {user_id}")))?;
        balance.status = status;
        balance.updated_at = Utc::now();
        Ok(balance.clone())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, input: &NewNotification) -> AppResult<Notification> {
        let notification = input.clone().into_notification(Uuid::now_v7(), Utc::now());
        self.state
            .lock()
            .await
            .notifications
            .push(notification.clone());
        Ok(notification)
    }

    async fn list_for_viewer(
        &self,
        viewer: &Viewer,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let state = self.state.lock().await;
        let items: Vec<Notification> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.is_visible_to(viewer) && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }

    async fn find_notification(&self, id: Uuid) -> AppResult<Option<Notification>> {
        Ok(self
            .state
            .lock()
            .await
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned())
    }

    async fn set_read(&self, id: Uuid, is_read: bool) -> AppResult<Notification> {
        let mut state = self.state.lock().await;
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;
        let now = Utc::now();
        notification.is_read = is_read;
        notification.read_at = if is_read {
            notification.read_at.or(Some(now))
        } else {
            None
        };
        notification.updated_at = now;
        Ok(notification.clone())
    }

    async fn mark_all_read(&self, viewer: &Viewer) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut changed = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| !n.is_read && n.is_visible_to(viewer))
        {
            n.is_read = true;
            n.read_at = Some(now);
            n.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_unread(&self, viewer: &Viewer) -> AppResult<i64> {
        Ok(self
            .state
            .lock()
            .await
            .notifications
            .iter()
            .filter(|n| !n.is_read && n.is_visible_to(viewer))
            .count() as i64)
    }

    async fn delete_notification(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id != id);
        Ok(state.notifications.len() < before)
    }

    async fn prune_before(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let count = state.notifications.len();
        state.notifications.retain(|n| n.created_at >= before);
        Ok((count - state.notifications.len()) as u64)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_template(&self, input: &NewTemplate) -> AppResult<DocumentTemplate> {
        let template = input.clone().into_template(Uuid::now_v7(), Utc::now());
        self.state
            .lock()
            .await
            .templates
            .insert(template.id, template.clone());
        Ok(template)
    }

    async fn find_template(&self, id: Uuid) -> AppResult<Option<DocumentTemplate>> {
        Ok(self.state.lock().await.templates.get(&id).cloned())
    }

    async fn list_templates(
        &self,
        category: Option<TemplateCategory>,
        include_inactive: bool,
    ) -> AppResult<Vec<DocumentTemplate>> {
        let state = self.state.lock().await;
        let mut templates: Vec<DocumentTemplate> = state
            .templates
            .values()
            .filter(|t| category.is_none_or(|c| t.category == c))
            .filter(|t| include_inactive || t.is_active)
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn begin_generation(
        &self,
        input: &NewDocument,
    ) -> AppResult<(GeneratedDocument, Option<LedgerMovement>)> {
        let mut state = self.state.lock().await;
        if state.documents.contains_key(&input.id) {
            return Err(AppError::conflict(format!(
                "Document {} already exists",
                input.id
            )));
        }
        let movement = if input.credits_charged > 0 {
            let reference = GeneratedDocument::reference_for(input.id);
            Some(state.debit(
                input.user_id,
                input.credits_charged,
                &input.reason,
                Some(&reference),
            )?)
        } else {
            None
        };
        let document = input
            .clone()
            .into_pending(movement.as_ref().map(|m| m.transaction.id), Utc::now());
        state.documents.insert(document.id, document.clone());
        Ok((document, movement))
    }

    async fn complete_generation(
        &self,
        id: Uuid,
        file_path: &str,
        file_url: &str,
    ) -> AppResult<GeneratedDocument> {
        let mut state = self.state.lock().await;
        let document = state.transition(id, DocumentStatus::Completed)?;
        document.file_path = Some(file_path.to_string());
        document.file_url = Some(file_url.to_string());
        let document = document.clone();

        if let Some(template) = state.templates.get_mut(&document.template_id) {
            template.usage_count += 1;
            template.last_used_at = document.completed_at;
        }
        Ok(document)
    }

    async fn fail_generation(&self, id: Uuid, error: &str) -> AppResult<GeneratedDocument> {
        let mut state = self.state.lock().await;
        let document = state.transition(id, DocumentStatus::Failed)?;
        document.error_message = Some(error.to_string());
        Ok(document.clone())
    }

    async fn attach_refund(
        &self,
        id: Uuid,
        refund_transaction_id: Uuid,
    ) -> AppResult<GeneratedDocument> {
        let mut state = self.state.lock().await;
        let document = state
            .documents
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;
        if document.status != DocumentStatus::Failed {
            return Err(AppError::conflict(format!(
                "Document {id} cannot move from {} to refunded",
                document.status
            )));
        }
        document
            .refund_transaction_id
            .get_or_insert(refund_transaction_id);
        Ok(document.clone())
    }

    async fn find_document(&self, id: Uuid) -> AppResult<Option<GeneratedDocument>> {
        Ok(self.state.lock().await.documents.get(&id).cloned())
    }

    async fn list_documents(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<GeneratedDocument>> {
        let state = self.state.lock().await;
        let mut docs: Vec<GeneratedDocument> = state
            .documents
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(docs, page))
    }

    async fn list_unrefunded_failures(&self, limit: i64) -> AppResult<Vec<GeneratedDocument>> {
        let state = self.state.lock().await;
        let mut docs: Vec<GeneratedDocument> = state
            .documents
            .values()
            .filter(|d| d.needs_refund())
            .cloned()
            .collect();
        docs.sort_by_key(|d| d.created_at);
        docs.truncate(limit.max(0) as usize);
        Ok(docs)
    }

    async fn list_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<GeneratedDocument>> {
        let state = self.state.lock().await;
        let mut docs: Vec<GeneratedDocument> = state
            .documents
            .values()
            .filter(|d| d.status == DocumentStatus::Pending && d.created_at < older_than)
            .cloned()
            .collect();
        docs.sort_by_key(|d| d.created_at);
        docs.truncate(limit.max(0) as usize);
        Ok(docs)
    }

    async fn count_completed_for_school(&self, school_id: Uuid) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .documents
            .values()
            .filter(|d| d.status == DocumentStatus::Completed)
            .filter(|d| {
                state
                    .users
                    .get(&d.user_id)
                    .is_some_and(|u| u.school_id == Some(school_id))
            })
            .count() as i64)
    }
}

#[async_trait]
impl RosterStore for MemoryStore {
    async fn create_student(&self, input: &NewStudent) -> AppResult<Student> {
        let mut state = self.state.lock().await;
        if state
            .students
            .iter()
            .any(|s| s.school_id == input.school_id && s.student_code == input.student_code)
        {
            return Err(AppError::conflict(format!(
                "Student code {} already exists",
                input.student_code
            )));
        }
        let student = input.clone().into_student(Uuid::now_v7(), Utc::now());
        state.students.push(student.clone());
        Ok(student)
    }

    async fn list_students(
        &self,
        query: &StudentQuery,
        page: PageRequest,
    ) -> AppResult<PageResponse<Student>> {
        let state = self.state.lock().await;
        let mut students: Vec<Student> = state
            .students
            .iter()
            .filter(|s| s.school_id == query.school_id && s.is_active)
            .filter(|s| query.search.as_deref().is_none_or(|q| s.matches_search(q)))
            .filter(|s| {
                query
                    .class_name
                    .as_deref()
                    .is_none_or(|c| s.class_name == c)
            })
            .cloned()
            .collect();
        students.sort_by(|a, b| {
            a.class_name
                .cmp(&b.class_name)
                .then(a.roll_number.is_none().cmp(&b.roll_number.is_none()))
                .then(a.roll_number.cmp(&b.roll_number))
                .then(a.full_name.cmp(&b.full_name))
        });
        Ok(paginate(students, page))
    }

    async fn count_students(&self, school_id: Uuid) -> AppResult<i64> {
        Ok(self
            .state
            .lock()
            .await
            .students
            .iter()
            .filter(|s| s.school_id == school_id && s.is_active)
            .count() as i64)
    }

    async fn create_teacher(&self, input: &NewTeacher) -> AppResult<Teacher> {
        let mut state = self.state.lock().await;
        if state
            .teachers
            .iter()
            .any(|t| t.school_id == input.school_id && t.employee_code == input.employee_code)
        {
            return Err(AppError::conflict(format!(
                "Employee code {} already exists",
                input.employee_code
            )));
        }
        let teacher = input.clone().into_teacher(Uuid::now_v7(), Utc::now());
        state.teachers.push(teacher.clone());
        Ok(teacher)
    }

    async fn list_teachers(
        &self,
        school_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<Teacher>> {
        let state = self.state.lock().await;
        let mut teachers: Vec<Teacher> = state
            .teachers
            .iter()
            .filter(|t| t.school_id == school_id && t.is_active)
            .cloned()
            .collect();
        teachers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(paginate(teachers, page))
    }

    async fn count_teachers(&self, school_id: Uuid) -> AppResult<i64> {
        Ok(self
            .state
            .lock()
            .await
            .teachers
            .iter()
            .filter(|t| t.school_id == school_id && t.is_active)
            .count() as i64)
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn create_book(&self, input: &NewBook) -> AppResult<LibraryBook> {
        let available = input.available_copies.unwrap_or(input.total_copies);
        if input.total_copies < 0 || available < 0 || available > input.total_copies {
            return Err(AppError::validation(
                "availableCopies must be between 0 and totalCopies",
            ));
        }
        let book = input.clone().into_book(Uuid::now_v7(), Utc::now());
        self.state.lock().await.books.push(book.clone());
        Ok(book)
    }

    async fn list_books(
        &self,
        query: &BookQuery,
        page: PageRequest,
    ) -> AppResult<PageResponse<LibraryBook>> {
        let state = self.state.lock().await;
        let mut books: Vec<LibraryBook> = state
            .books
            .iter()
            .filter(|b| b.school_id == query.school_id)
            .filter(|b| query.search.as_deref().is_none_or(|q| b.matches_search(q)))
            .filter(|b| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|c| b.category.as_deref() == Some(c))
            })
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(paginate(books, page))
    }

    async fn book_totals(&self, school_id: Uuid) -> AppResult<BookTotals> {
        let state = self.state.lock().await;
        Ok(state
            .books
            .iter()
            .filter(|b| b.school_id == school_id)
            .fold(BookTotals::default(), |acc, b| BookTotals {
                total: acc.total + i64::from(b.total_copies),
                available: acc.available + i64::from(b.available_copies),
            }))
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn create_item(&self, input: &NewInventoryItem) -> AppResult<InventoryItem> {
        if input.quantity < 0 || input.reorder_level < 0 {
            return Err(AppError::validation(
                "quantity and reorderLevel must not be negative",
            ));
        }
        let item = input.clone().into_item(Uuid::now_v7(), Utc::now());
        self.state.lock().await.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<InventoryItem>> {
        Ok(self.state.lock().await.items.get(&id).cloned())
    }

    async fn list_items(
        &self,
        school_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<InventoryItem>> {
        let state = self.state.lock().await;
        let mut items: Vec<InventoryItem> = state
            .items
            .values()
            .filter(|i| i.school_id == school_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(items, page))
    }

    async fn record_movement(
        &self,
        input: &NewStockMovement,
    ) -> AppResult<(InventoryItem, StockMovement)> {
        let mut state = self.state.lock().await;
        let item = state.items.get_mut(&input.item_id).ok_or_else(|| {
            AppError::not_found(format!("Inventory item {} not found", input.item_id))
        })?;
        let next = item.quantity + input.delta;
        if next < 0 {
            return Err(AppError::validation(format!(
                "Insufficient stock: requested {}, available {}",
                -input.delta,
                item.quantity
            )));
        }
        let now = Utc::now();
        item.quantity = next;
        item.updated_at = now;
        let item = item.clone();

        let movement = StockMovement {
            id: Uuid::now_v7(),
            item_id: item.id,
            delta: input.delta,
            reason: input.reason.clone(),
            quantity_after: item.quantity,
            created_by: input.created_by,
            created_at: now,
        };
        state.movements.push(movement.clone());
        Ok((item, movement))
    }

    async fn list_movements(
        &self,
        item_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<StockMovement>> {
        let state = self.state.lock().await;
        let items: Vec<StockMovement> = state
            .movements
            .iter()
            .rev()
            .filter(|m| m.item_id == item_id)
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }

    async fn count_low_stock(&self, school_id: Uuid) -> AppResult<i64> {
        Ok(self
            .state
            .lock()
            .await
            .items
            .values()
            .filter(|i| i.school_id == school_id && i.is_low_stock())
            .count() as i64)
    }
}

#[async_trait]
impl HealthStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
