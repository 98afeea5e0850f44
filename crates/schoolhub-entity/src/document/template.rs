//! Document template entity and input validation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use schoolhub_core::{AppError, AppResult};

/// What a template produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "template_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    /// Student or staff ID card.
    IdCard,
    /// Exam admit card.
    AdmitCard,
    /// Certificate.
    Certificate,
    /// Academic transcript.
    Transcript,
    /// Testimonial letter.
    Testimonial,
    /// Anything else.
    Other,
}

impl TemplateCategory {
    /// Return the category as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdCard => "id_card",
            Self::AdmitCard => "admit_card",
            Self::Certificate => "certificate",
            Self::Transcript => "transcript",
            Self::Testimonial => "testimonial",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "id_card" => Ok(Self::IdCard),
            "admit_card" => Ok(Self::AdmitCard),
            "certificate" => Ok(Self::Certificate),
            "transcript" => Ok(Self::Transcript),
            "testimonial" => Ok(Self::Testimonial),
            "other" => Ok(Self::Other),
            _ => Err(AppError::validation(format!(
                "Invalid template category: '{s}'"
            ))),
        }
    }
}

/// Value type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// Multi-line text.
    Textarea,
    /// Integer or decimal number.
    Number,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Image URL (photo, signature).
    Image,
}

/// One entry in a template's field schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    /// Key in the input data and `{{name}}` placeholder in the layout.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Display label in Bengali.
    #[serde(default)]
    pub label_bn: Option<String>,
    /// Value type.
    #[serde(default = "default_field_type")]
    pub field_type: FieldType,
    /// Whether a value must be supplied.
    #[serde(default)]
    pub required: bool,
}

fn default_field_type() -> FieldType {
    FieldType::Text
}

impl TemplateField {
    fn check(&self, value: Option<&serde_json::Value>) -> Option<String> {
        use serde_json::Value;

        let value = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        };
        let Some(value) = value else {
            return self
                .required
                .then(|| format!("'{}' is required", self.name));
        };

        let ok = match (self.field_type, value) {
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::Number, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
            (FieldType::Date, Value::String(s)) => {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok()
            }
            (FieldType::Text | FieldType::Textarea, Value::String(_) | Value::Number(_)) => true,
            (FieldType::Image, Value::String(_)) => true,
            _ => false,
        };
        (!ok).then(|| {
            format!(
                "'{}' must be a {}",
                self.name,
                match self.field_type {
                    FieldType::Number => "number",
                    FieldType::Date => "date (YYYY-MM-DD)",
                    FieldType::Image => "URL string",
                    FieldType::Text | FieldType::Textarea => "string",
                }
            )
        })
    }
}

/// A document template in `document_templates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    /// Unique template identifier.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Name in Bengali.
    pub name_bn: Option<String>,
    /// What the template produces.
    pub category: TemplateCategory,
    /// Audience, e.g. `student` or `teacher`.
    pub template_type: String,
    /// Field schema.
    pub fields: Json<Vec<TemplateField>>,
    /// HTML layout with `{{field}}` placeholders.
    pub layout: String,
    /// Credits debited per generation.
    pub credit_cost: i64,
    /// Completed generations so far.
    pub usage_count: i64,
    /// When the template was last used.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Whether the template may be used.
    pub is_active: bool,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
    /// When the template was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DocumentTemplate {
    /// Check `input` against the field schema.
    ///
    /// Keys outside the schema are ignored. All field errors are reported
    /// together.
    pub fn validate_input(&self, input: &serde_json::Value) -> AppResult<()> {
        let Some(object) = input.as_object() else {
            return Err(AppError::validation("Input data must be a JSON object"));
        };
        let errors: Vec<String> = self
            .fields
            .iter()
            .filter_map(|field| field.check(object.get(&field.name)))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Invalid input for template '{}': {}",
                self.name,
                errors.join("; ")
            )))
        }
    }
}

/// Data required to create a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    /// Name.
    pub name: String,
    /// Name in Bengali.
    pub name_bn: Option<String>,
    /// What the template produces.
    pub category: TemplateCategory,
    /// Audience.
    pub template_type: String,
    /// Field schema.
    pub fields: Vec<TemplateField>,
    /// HTML layout.
    pub layout: String,
    /// Credits debited per generation.
    pub credit_cost: i64,
}

impl NewTemplate {
    /// Materialize the row this input produces.
    pub fn into_template(self, id: Uuid, now: DateTime<Utc>) -> DocumentTemplate {
        DocumentTemplate {
            id,
            name: self.name,
            name_bn: self.name_bn,
            category: self.category,
            template_type: self.template_type,
            fields: Json(self.fields),
            layout: self.layout,
            credit_cost: self.credit_cost,
            usage_count: 0,
            last_used_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> DocumentTemplate {
        NewTemplate {
            name: "Student ID".into(),
            name_bn: None,
            category: TemplateCategory::IdCard,
            template_type: "student".into(),
            fields: vec![
                TemplateField {
                    name: "name".into(),
                    label: "Name".into(),
                    label_bn: Some("নাম".into()),
                    field_type: FieldType::Text,
                    required: true,
                },
                TemplateField {
                    name: "roll".into(),
                    label: "Roll".into(),
                    label_bn: None,
                    field_type: FieldType::Number,
                    required: true,
                },
                TemplateField {
                    name: "dob".into(),
                    label: "Date of birth".into(),
                    label_bn: None,
                    field_type: FieldType::Date,
                    required: false,
                },
            ],
            layout: "<h1>{{name}}</h1>".into(),
            credit_cost: 5,
        }
        .into_template(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_valid_input() {
        let t = template();
        assert!(t.validate_input(&json!({"name": "Rahim", "roll": 12})).is_ok());
        assert!(t
            .validate_input(&json!({"name": "Rahim", "roll": "12", "dob": "2012-04-01", "extra": true}))
            .is_ok());
    }

    #[test]
    fn test_missing_and_malformed_fields() {
        let t = template();
        let err = t
            .validate_input(&json!({"name": "  ", "roll": "twelve", "dob": "01/04/2012"}))
            .unwrap_err();
        assert_eq!(err.kind, schoolhub_core::ErrorKind::Validation);
        assert!(err.message.contains("'name' is required"));
        assert!(err.message.contains("'roll' must be a number"));
        assert!(err.message.contains("'dob' must be a date"));
    }

    #[test]
    fn test_non_object_input() {
        assert!(template().validate_input(&json!(["Rahim"])).is_err());
    }
}
