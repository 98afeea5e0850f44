//! Document template and generated document entities.

pub mod generated;
pub mod status;
pub mod template;

pub use generated::{GeneratedDocument, NewDocument};
pub use status::DocumentStatus;
pub use template::{DocumentTemplate, FieldType, NewTemplate, TemplateCategory, TemplateField};
