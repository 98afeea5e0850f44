//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::credit::CreditBalance;
use schoolhub_entity::user::{CreateUser, User, UserStatus};

use super::ledger::open_account_in;
use crate::error::db_err;
use crate::store::UserStore;

/// Repository for `app_users`.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(
        &self,
        input: &CreateUser,
        initial_grant: i64,
    ) -> AppResult<(User, CreditBalance)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin user creation"))?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO app_users (id, email, full_name, full_name_bn, role, school_id) \
             VALUES ($1, LOWER($2), $3, $4, $5, $6) RETURNING *",
        )
        .bind(input.id.unwrap_or_else(Uuid::now_v7))
        .bind(input.email.trim())
        .bind(&input.full_name)
        .bind(&input.full_name_bn)
        .bind(input.role)
        .bind(input.school_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to create user"))?;

        let balance = open_account_in(&mut tx, user.id, initial_grant).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit user creation"))?;
        Ok((user, balance))
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM app_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find user by id"))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM app_users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find user by email"))
    }

    async fn set_user_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE app_users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update user status"))?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn list_users(
        &self,
        school_id: Option<Uuid>,
        page: PageRequest,
    ) -> AppResult<PageResponse<User>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM app_users WHERE ($1::uuid IS NULL OR school_id = $1)",
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count users"))?;

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM app_users WHERE ($1::uuid IS NULL OR school_id = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(school_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list users"))?;

        Ok(PageResponse::new(users, page, total))
    }
}
