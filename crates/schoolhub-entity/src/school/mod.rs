//! Student and teacher records.

pub mod student;
pub mod teacher;

pub use student::{NewStudent, Student};
pub use teacher::{NewTeacher, Teacher};
