//! Request DTOs with validation.
//!
//! Bodies and query strings use camelCase keys.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use schoolhub_entity::credit::PaymentMethod;
use schoolhub_entity::document::{NewTemplate, TemplateCategory, TemplateField};
use schoolhub_entity::inventory::NewInventoryItem;
use schoolhub_entity::library::NewBook;
use schoolhub_entity::notification::{
    NewNotification, NotificationCategory, NotificationPriority, NotificationType,
};
use schoolhub_entity::school::{NewStudent, NewTeacher};
use schoolhub_entity::user::{CreateUser, UserRole};

/// Create user request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Auth-provider subject to reuse as the user id.
    pub id: Option<Uuid>,
    /// Email.
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    /// Full name.
    #[validate(length(min = 1, max = 200, message = "fullName is required"))]
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Role.
    pub role: UserRole,
    /// School.
    pub school_id: Option<Uuid>,
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            id: req.id,
            email: req.email,
            full_name: req.full_name,
            full_name_bn: req.full_name_bn,
            role: req.role,
            school_id: req.school_id,
        }
    }
}

/// `?userId=` for endpoints that default to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    /// Another user (admin only).
    pub user_id: Option<Uuid>,
}

/// Debit request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeductRequest {
    /// Credits to debit.
    #[validate(range(min = 1, max = 1_000_000_000, message = "amount must be between 1 and 1000000000"))]
    pub amount: i64,
    /// Why the credits are spent.
    #[validate(length(min = 1, max = 500, message = "reason is required"))]
    pub reason: String,
    /// Optional reference to the thing paid for.
    pub reference: Option<String>,
}

/// Top-up request. Replays with the same `externalTransactionId` credit once.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    /// Amount paid, in currency units.
    #[validate(range(min = 1, max = 1_000_000_000, message = "amount must be between 1 and 1000000000"))]
    pub amount: i64,
    /// Payment channel.
    pub payment_method: PaymentMethod,
    /// Provider-side transaction id.
    #[validate(length(min = 1, max = 200, message = "externalTransactionId is required"))]
    pub external_transaction_id: String,
    /// Account to credit (admin only; defaults to the caller).
    pub user_id: Option<Uuid>,
}

/// Bonus grant request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    /// Recipient.
    pub user_id: Uuid,
    /// Credits to grant.
    #[validate(range(min = 1, max = 1_000_000_000, message = "amount must be between 1 and 1000000000"))]
    pub amount: i64,
    /// Why.
    #[validate(length(min = 1, max = 500, message = "reason is required"))]
    pub reason: String,
}

/// Suspend or reactivate a balance (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceStatusRequest {
    /// `active` or `suspended`.
    pub status: schoolhub_entity::credit::BalanceStatus,
}

/// Publish request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishNotificationRequest {
    /// Title.
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    /// Title in Bengali.
    pub title_bn: Option<String>,
    /// Body.
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    /// Body in Bengali.
    pub message_bn: Option<String>,
    /// Tone (default `info`).
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    /// Priority (default `normal`).
    pub priority: Option<NotificationPriority>,
    /// Category (default `general`).
    pub category: Option<NotificationCategory>,
    /// Single recipient.
    pub recipient_id: Option<Uuid>,
    /// Everyone with this role.
    pub recipient_role: Option<UserRole>,
    /// Everyone in this school.
    pub school_id: Option<Uuid>,
}

impl From<PublishNotificationRequest> for NewNotification {
    fn from(req: PublishNotificationRequest) -> Self {
        Self {
            title: req.title,
            title_bn: req.title_bn,
            message: req.message,
            message_bn: req.message_bn,
            notification_type: req.notification_type.unwrap_or(NotificationType::Info),
            priority: req.priority.unwrap_or_default(),
            category: req.category.unwrap_or(NotificationCategory::General),
            recipient_id: req.recipient_id,
            recipient_role: req.recipient_role,
            school_id: req.school_id,
            created_by: None,
        }
    }
}

/// `?unreadOnly=` filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    /// Only unread rows.
    #[serde(default)]
    pub unread_only: bool,
}

/// Read-flag toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetReadRequest {
    /// New read state.
    #[serde(default = "default_true")]
    pub is_read: bool,
}

fn default_true() -> bool {
    true
}

/// Realtime feed authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct WsQuery {
    /// Session token.
    pub token: String,
}

/// Template listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    /// Only this category.
    pub category: Option<TemplateCategory>,
    /// Include deactivated templates (admin only).
    #[serde(default)]
    pub include_inactive: bool,
}

/// Create template request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    /// Name.
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    /// Name in Bengali.
    pub name_bn: Option<String>,
    /// What the template produces.
    pub category: TemplateCategory,
    /// Audience.
    #[validate(length(min = 1, max = 100, message = "templateType is required"))]
    pub template_type: String,
    /// Field schema.
    #[serde(default)]
    pub fields: Vec<TemplateField>,
    /// HTML layout with `{{ field }}` placeholders.
    #[validate(length(min = 1, message = "layout is required"))]
    pub layout: String,
    /// Credits per generation.
    #[validate(range(min = 0, message = "creditCost must not be negative"))]
    pub credit_cost: i64,
}

impl From<CreateTemplateRequest> for NewTemplate {
    fn from(req: CreateTemplateRequest) -> Self {
        Self {
            name: req.name,
            name_bn: req.name_bn,
            category: req.category,
            template_type: req.template_type,
            fields: req.fields,
            layout: req.layout,
            credit_cost: req.credit_cost,
        }
    }
}

/// Generation request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentRequest {
    /// Template to render.
    pub template_id: Uuid,
    /// Field values.
    #[serde(default, alias = "data")]
    pub input_data: serde_json::Value,
}

/// `?schoolId=` for school-scoped endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolQuery {
    /// School (defaults to the caller's).
    pub school_id: Option<Uuid>,
}

/// Student listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuery {
    /// School (defaults to the caller's).
    pub school_id: Option<Uuid>,
    /// Name or code fragment.
    pub search: Option<String>,
    /// Class.
    pub class_name: Option<String>,
}

/// Book listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
    /// School (defaults to the caller's).
    pub school_id: Option<Uuid>,
    /// Title, author or ISBN fragment.
    pub search: Option<String>,
    /// Category.
    pub category: Option<String>,
}

/// Enrol student request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    /// School (defaults to the caller's).
    pub school_id: Option<Uuid>,
    /// Linked login.
    pub user_id: Option<Uuid>,
    /// School-assigned code.
    #[validate(length(min = 1, max = 50))]
    pub student_code: String,
    /// Full name.
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Class.
    #[validate(length(min = 1, max = 50))]
    pub class_name: String,
    /// Section.
    pub section: Option<String>,
    /// Roll number.
    #[validate(range(min = 1))]
    pub roll_number: Option<i32>,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Guardian name.
    pub guardian_name: Option<String>,
    /// Guardian phone.
    pub guardian_phone: Option<String>,
}

impl CreateStudentRequest {
    /// The store input for `school_id`.
    pub fn into_new(self, school_id: Uuid) -> NewStudent {
        NewStudent {
            school_id,
            user_id: self.user_id,
            student_code: self.student_code,
            full_name: self.full_name,
            full_name_bn: self.full_name_bn,
            class_name: self.class_name,
            section: self.section,
            roll_number: self.roll_number,
            date_of_birth: self.date_of_birth,
            guardian_name: self.guardian_name,
            guardian_phone: self.guardian_phone,
        }
    }
}

/// Add teacher request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacherRequest {
    /// School (defaults to the caller's).
    pub school_id: Option<Uuid>,
    /// Linked login.
    pub user_id: Option<Uuid>,
    /// Employee code.
    #[validate(length(min = 1, max = 50))]
    pub employee_code: String,
    /// Full name.
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    /// Full name in Bengali.
    pub full_name_bn: Option<String>,
    /// Designation.
    pub designation: Option<String>,
    /// Main subject.
    pub subject: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Email.
    #[validate(email)]
    pub email: Option<String>,
}

impl CreateTeacherRequest {
    /// The store input for `school_id`.
    pub fn into_new(self, school_id: Uuid) -> NewTeacher {
        NewTeacher {
            school_id,
            user_id: self.user_id,
            employee_code: self.employee_code,
            full_name: self.full_name,
            full_name_bn: self.full_name_bn,
            designation: self.designation,
            subject: self.subject,
            phone: self.phone,
            email: self.email,
        }
    }
}

/// Catalogue book request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    /// School (defaults to the caller's).
    pub school_id: Option<Uuid>,
    /// Title.
    #[validate(length(min = 1, max = 300))]
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
    #[validate(range(min = 0))]
    pub total_copies: i32,
    /// Copies on the shelf (defaults to all).
    #[validate(range(min = 0))]
    pub available_copies: Option<i32>,
    /// Shelf.
    pub shelf_location: Option<String>,
}

impl CreateBookRequest {
    /// The store input for `school_id`.
    pub fn into_new(self, school_id: Uuid) -> NewBook {
        NewBook {
            school_id,
            title: self.title,
            title_bn: self.title_bn,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            total_copies: self.total_copies,
            available_copies: self.available_copies,
            shelf_location: self.shelf_location,
        }
    }
}

/// Add inventory item request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    /// School (defaults to the caller's).
    pub school_id: Option<Uuid>,
    /// Name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Name in Bengali.
    pub name_bn: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Counting unit.
    #[validate(length(min = 1, max = 50))]
    pub unit: String,
    /// Opening stock.
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity: i32,
    /// Low-stock threshold.
    #[validate(range(min = 0))]
    #[serde(default)]
    pub reorder_level: i32,
    /// Storage location.
    pub location: Option<String>,
}

impl CreateItemRequest {
    /// The store input for `school_id`.
    pub fn into_new(self, school_id: Uuid) -> NewInventoryItem {
        NewInventoryItem {
            school_id,
            name: self.name,
            name_bn: self.name_bn,
            category: self.category,
            unit: self.unit,
            quantity: self.quantity,
            reorder_level: self.reorder_level,
            location: self.location,
        }
    }
}

/// Stock movement request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementRequest {
    /// Signed quantity change.
    pub delta: i32,
    /// Why the stock moved.
    #[validate(length(min = 1, max = 500, message = "reason is required"))]
    pub reason: String,
}
