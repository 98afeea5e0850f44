//! Student and teacher repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::school::{NewStudent, NewTeacher, Student, Teacher};

use super::like_pattern;
use crate::error::db_err;
use crate::store::{RosterStore, StudentQuery};

/// Repository for `students` and `teachers`.
#[derive(Debug, Clone)]
pub struct RosterRepository {
    pool: PgPool,
}

impl RosterRepository {
    /// Create a new roster repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const STUDENT_FILTER: &str = "school_id = $1 AND is_active \
     AND ($2::text IS NULL OR full_name ILIKE $2 OR full_name_bn ILIKE $2 OR student_code ILIKE $2) \
     AND ($3::text IS NULL OR class_name = $3)";

#[async_trait]
impl RosterStore for RosterRepository {
    async fn create_student(&self, input: &NewStudent) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            "INSERT INTO students \
             (id, school_id, user_id, student_code, full_name, full_name_bn, class_name, section, \
              roll_number, date_of_birth, guardian_name, guardian_phone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.school_id)
        .bind(input.user_id)
        .bind(&input.student_code)
        .bind(&input.full_name)
        .bind(&input.full_name_bn)
        .bind(&input.class_name)
        .bind(&input.section)
        .bind(input.roll_number)
        .bind(input.date_of_birth)
        .bind(&input.guardian_name)
        .bind(&input.guardian_phone)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create student"))
    }

    async fn list_students(
        &self,
        query: &StudentQuery,
        page: PageRequest,
    ) -> AppResult<PageResponse<Student>> {
        let search = query.search.as_deref().map(like_pattern);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM students WHERE {STUDENT_FILTER}"))
                .bind(query.school_id)
                .bind(&search)
                .bind(&query.class_name)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("Failed to count students"))?;

        let items = sqlx::query_as::<_, Student>(&format!(
            "SELECT * FROM students WHERE {STUDENT_FILTER} \
             ORDER BY class_name, roll_number NULLS LAST, full_name LIMIT $4 OFFSET $5"
        ))
        .bind(query.school_id)
        .bind(&search)
        .bind(&query.class_name)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list students"))?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn count_students(&self, school_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE school_id = $1 AND is_active")
            .bind(school_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count students"))
    }

    async fn create_teacher(&self, input: &NewTeacher) -> AppResult<Teacher> {
        sqlx::query_as::<_, Teacher>(
            "INSERT INTO teachers \
             (id, school_id, user_id, employee_code, full_name, full_name_bn, designation, \
              subject, phone, email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.school_id)
        .bind(input.user_id)
        .bind(&input.employee_code)
        .bind(&input.full_name)
        .bind(&input.full_name_bn)
        .bind(&input.designation)
        .bind(&input.subject)
        .bind(&input.phone)
        .bind(&input.email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create teacher"))
    }

    async fn list_teachers(
        &self,
        school_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<Teacher>> {
        let total = self.count_teachers(school_id).await?;

        let items = sqlx::query_as::<_, Teacher>(
            "SELECT * FROM teachers WHERE school_id = $1 AND is_active \
             ORDER BY full_name LIMIT $2 OFFSET $3",
        )
        .bind(school_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list teachers"))?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn count_teachers(&self, school_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM teachers WHERE school_id = $1 AND is_active")
            .bind(school_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count teachers"))
    }
}
