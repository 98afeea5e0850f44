//! Student and teacher records.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_database::store::{RosterStore, StudentQuery};
use schoolhub_entity::school::{NewStudent, NewTeacher, Student, Teacher};

use crate::context::RequestContext;

/// Manages a school's students and teachers.
#[derive(Clone)]
pub struct RosterService {
    roster: Arc<dyn RosterStore>,
}

impl std::fmt::Debug for RosterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterService").finish_non_exhaustive()
    }
}

fn required(value: &str, name: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{name} is required"));
    }
}

fn into_result(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(errors.join("; ")))
    }
}

impl RosterService {
    /// Creates a new roster service.
    pub fn new(roster: Arc<dyn RosterStore>) -> Self {
        Self { roster }
    }

    /// Students of a school, ordered by class and roll number.
    pub async fn list_students(
        &self,
        ctx: &RequestContext,
        school_id: Option<Uuid>,
        search: Option<String>,
        class_name: Option<String>,
        page: PageRequest,
    ) -> Result<PageResponse<Student>, AppError> {
        ctx.require(SystemPermission::RecordsView)?;
        let query = StudentQuery {
            school_id: ctx.resolve_school(school_id)?,
            search: search.filter(|s| !s.trim().is_empty()),
            class_name: class_name.filter(|s| !s.trim().is_empty()),
        };
        self.roster.list_students(&query, page.normalized()).await
    }

    /// Enrol a student.
    pub async fn create_student(
        &self,
        ctx: &RequestContext,
        input: NewStudent,
    ) -> Result<Student, AppError> {
        ctx.require(SystemPermission::RecordsManage)?;
        ctx.require_school(input.school_id)?;
        let mut errors = Vec::new();
        required(&input.student_code, "studentCode", &mut errors);
        required(&input.full_name, "fullName", &mut errors);
        required(&input.class_name, "className", &mut errors);
        if input.roll_number.is_some_and(|r| r <= 0) {
            errors.push("rollNumber must be positive".to_string());
        }
        into_result(errors)?;

        let student = self.roster.create_student(&input).await?;
        info!(student_id = %student.id, school_id = %student.school_id, "Student enrolled");
        Ok(student)
    }

    /// Teachers of a school, by name.
    pub async fn list_teachers(
        &self,
        ctx: &RequestContext,
        school_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<PageResponse<Teacher>, AppError> {
        ctx.require(SystemPermission::RecordsView)?;
        let school_id = ctx.resolve_school(school_id)?;
        self.roster.list_teachers(school_id, page.normalized()).await
    }

    /// Add a teacher.
    pub async fn create_teacher(
        &self,
        ctx: &RequestContext,
        input: NewTeacher,
    ) -> Result<Teacher, AppError> {
        ctx.require(SystemPermission::RecordsManage)?;
        ctx.require_school(input.school_id)?;
        let mut errors = Vec::new();
        required(&input.employee_code, "employeeCode", &mut errors);
        required(&input.full_name, "fullName", &mut errors);
        into_result(errors)?;

        let teacher = self.roster.create_teacher(&input).await?;
        info!(teacher_id = %teacher.id, school_id = %teacher.school_id, "Teacher added");
        Ok(teacher)
    }
}
