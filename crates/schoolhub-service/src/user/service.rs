//! User accounts: creation with credit account, lookup, deactivation.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_database::store::UserStore;
use schoolhub_entity::credit::CreditBalance;
use schoolhub_entity::user::{CreateUser, User, UserStatus};

use crate::context::RequestContext;

/// Manages user accounts.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    initial_grant: i64,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("initial_grant", &self.initial_grant)
            .finish()
    }
}

impl UserService {
    /// Creates a new user service. New accounts receive `initial_grant`
    /// credits.
    pub fn new(users: Arc<dyn UserStore>, initial_grant: i64) -> Self {
        Self {
            users,
            initial_grant,
        }
    }

    /// Create a user and open their credit account (admin).
    pub async fn create(
        &self,
        ctx: &RequestContext,
        mut input: CreateUser,
    ) -> Result<(User, CreditBalance), AppError> {
        ctx.require(SystemPermission::UserCreate)?;
        input.email = input.email.trim().to_lowercase();
        input.full_name = input.full_name.trim().to_string();
        if !input.email.contains('@') || input.email.len() < 3 {
            return Err(AppError::validation(format!(
                "Invalid email address: '{}'",
                input.email
            )));
        }
        if input.full_name.is_empty() {
            return Err(AppError::validation("fullName is required"));
        }
        if let (Some(school), Some(_)) = (input.school_id, ctx.school_id) {
            ctx.require_school(school)?;
        }

        let (user, balance) = self.users.create_user(&input, self.initial_grant).await?;
        info!(
            user_id = %user.id,
            role = %user.role,
            initial_credits = balance.initial_credits,
            created_by = %ctx.user_id,
            "User created"
        );
        Ok((user, balance))
    }

    /// The caller's own account.
    pub async fn me(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.find(ctx.user_id).await
    }

    /// A user the caller may see: themselves, or anyone for admins.
    pub async fn get(&self, ctx: &RequestContext, user_id: Uuid) -> Result<User, AppError> {
        if user_id != ctx.user_id && !ctx.is_admin() {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        self.find(user_id).await
    }

    /// Look up a user by id.
    pub async fn find(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    /// Look up a user by email.
    pub async fn find_by_email(&self, email: &str) -> Result<User, AppError> {
        self.users
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No user with email {email}")))
    }

    /// Resolve the account behind a verified token. Unknown and inactive
    /// users are rejected.
    pub async fn authenticate(&self, user_id: Uuid) -> Result<User, AppError> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown user"))?;
        if !user.can_login() {
            return Err(AppError::unauthorized("Account is inactive"));
        }
        Ok(user)
    }

    /// Soft-deactivate a user (admin).
    pub async fn deactivate(&self, ctx: &RequestContext, user_id: Uuid) -> Result<User, AppError> {
        ctx.require(SystemPermission::UserDeactivate)?;
        if user_id == ctx.user_id {
            return Err(AppError::validation("You cannot deactivate your own account"));
        }
        let user = self.users.set_user_status(user_id, UserStatus::Inactive).await?;
        info!(user_id = %user_id, deactivated_by = %ctx.user_id, "User deactivated");
        Ok(user)
    }

    /// Users of a school (admin).
    pub async fn list(
        &self,
        ctx: &RequestContext,
        school_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<PageResponse<User>, AppError> {
        ctx.require(SystemPermission::UserCreate)?;
        let school_id = match school_id.or(ctx.school_id) {
            Some(id) => {
                ctx.require_school(id)?;
                Some(id)
            }
            None => None,
        };
        self.users.list_users(school_id, page.normalized()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_core::ErrorKind;
    use schoolhub_database::MemoryStore;
    use schoolhub_entity::user::UserRole;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()), 100)
    }

    fn input(email: &str) -> CreateUser {
        CreateUser {
            id: None,
            email: email.into(),
            full_name: "Nusrat Jahan".into(),
            full_name_bn: Some("নুসরাত জাহান".into()),
            role: UserRole::Teacher,
            school_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_opens_credit_account() {
        let svc = service();
        let (user, balance) = svc
            .create(&RequestContext::system(), input("  Nusrat@School.test "))
            .await
            .unwrap();
        assert_eq!(user.email, "nusrat@school.test");
        assert_eq!(balance.current_credits, 100);
        assert_eq!(balance.initial_credits, 100);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let svc = service();
        svc.create(&RequestContext::system(), input("a@school.test"))
            .await
            .unwrap();
        let err = svc
            .create(&RequestContext::system(), input("A@school.test"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_authenticate() {
        let svc = service();
        let (user, _) = svc
            .create(&RequestContext::system(), input("b@school.test"))
            .await
            .unwrap();
        assert!(svc.authenticate(user.id).await.is_ok());

        svc.deactivate(&RequestContext::system(), user.id).await.unwrap();
        let err = svc.authenticate(user.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(svc.find(user.id).await.unwrap().status, UserStatus::Inactive);
    }

    #[tokio::test]
    async fn test_teacher_cannot_create_users() {
        let svc = service();
        let teacher = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, None);
        let err = svc.create(&teacher, input("c@school.test")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }
}
