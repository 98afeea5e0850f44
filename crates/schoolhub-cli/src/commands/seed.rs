//! Reference data seeding.

use std::collections::HashSet;

use clap::{Args, Subcommand};

use crate::output;
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_entity::document::{FieldType, NewTemplate, TemplateCategory, TemplateField};
use schoolhub_service::RequestContext;

/// Arguments for the seed command
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Seed subcommand
    #[command(subcommand)]
    pub command: SeedCommand,
}

/// Seed subcommands
#[derive(Debug, Subcommand)]
pub enum SeedCommand {
    /// Install the built-in document templates. Existing names are skipped.
    Templates,
}

/// Execute seed commands
pub async fn execute(args: &SeedArgs, config: &AppConfig) -> Result<(), AppError> {
    let services = super::create_services(config).await?;
    let ctx = RequestContext::system();

    match &args.command {
        SeedCommand::Templates => {
            let existing: HashSet<String> = services
                .documents
                .list_templates(&ctx, None, true)
                .await?
                .into_iter()
                .map(|t| t.name)
                .collect();

            let mut created = 0;
            for template in default_templates() {
                if existing.contains(&template.name) {
                    output::print_warning(&format!("Template '{}' exists, skipped", template.name));
                    continue;
                }
                let name = template.name.clone();
                services.documents.create_template(&ctx, template).await?;
                output::print_kv(&name, "created");
                created += 1;
            }
            output::print_success(&format!("{} template(s) installed", created));
        }
    }

    Ok(())
}

fn field(name: &str, label: &str, label_bn: &str, field_type: FieldType, required: bool) -> TemplateField {
    TemplateField {
        name: name.to_string(),
        label: label.to_string(),
        label_bn: Some(label_bn.to_string()),
        field_type,
        required,
    }
}

fn student_fields() -> Vec<TemplateField> {
    vec![
        field("student_name", "Student name", "শিক্ষার্থীর নাম", FieldType::Text, true),
        field("class_name", "Class", "শ্রেণি", FieldType::Text, true),
        field("roll_number", "Roll", "রোল", FieldType::Number, true),
        field("school_name", "School", "বিদ্যালয়", FieldType::Text, true),
    ]
}

/// The templates every new installation starts with.
pub fn default_templates() -> Vec<NewTemplate> {
    let mut id_card = student_fields();
    id_card.push(field("photo_url", "Photo", "ছবি", FieldType::Image, false));
    id_card.push(field("blood_group", "Blood group", "রক্তের গ্রুপ", FieldType::Text, false));

    let mut admit_card = student_fields();
    admit_card.push(field("exam_name", "Examination", "পরীক্ষা", FieldType::Text, true));
    admit_card.push(field("exam_date", "Exam date", "পরীক্ষার তারিখ", FieldType::Date, true));

    let mut certificate = student_fields();
    certificate.push(field("achievement", "Achievement", "অর্জন", FieldType::Textarea, true));
    certificate.push(field("issue_date", "Issue date", "প্রদানের তারিখ", FieldType::Date, true));

    let mut testimonial = student_fields();
    testimonial.push(field("father_name", "Father's name", "পিতার নাম", FieldType::Text, true));
    testimonial.push(field("passing_year", "Passing year", "উত্তীর্ণের বছর", FieldType::Number, true));
    testimonial.push(field("issue_date", "Issue date", "প্রদানের তারিখ", FieldType::Date, true));

    let mut transcript = student_fields();
    transcript.push(field("exam_name", "Examination", "পরীক্ষা", FieldType::Text, true));
    transcript.push(field("gpa", "GPA", "জিপিএ", FieldType::Number, true));
    transcript.push(field("subjects", "Subject grades", "বিষয়ভিত্তিক গ্রেড", FieldType::Textarea, true));

    vec![
        NewTemplate {
            name: "Student ID Card".to_string(),
            name_bn: Some("শিক্ষার্থী পরিচয়পত্র".to_string()),
            category: TemplateCategory::IdCard,
            template_type: "student".to_string(),
            fields: id_card,
            layout: concat!(
                "<div class=\"id-card\"><h2>{{school_name}}</h2>",
                "<img src=\"{{photo_url}}\" alt=\"photo\"/>",
                "<p>{{student_name}}</p><p>Class {{class_name}}, Roll {{roll_number}}</p>",
                "<p>Blood group: {{blood_group}}</p></div>"
            )
            .to_string(),
            credit_cost: 2,
        },
        NewTemplate {
            name: "Admit Card".to_string(),
            name_bn: Some("প্রবেশপত্র".to_string()),
            category: TemplateCategory::AdmitCard,
            template_type: "student".to_string(),
            fields: admit_card,
            layout: concat!(
                "<div class=\"admit-card\"><h2>{{school_name}}</h2><h3>{{exam_name}}</h3>",
                "<p>{{student_name}}, Class {{class_name}}, Roll {{roll_number}}</p>",
                "<p>Date: {{exam_date}}</p></div>"
            )
            .to_string(),
            credit_cost: 1,
        },
        NewTemplate {
            name: "Certificate of Achievement".to_string(),
            name_bn: Some("কৃতিত্বের সনদপত্র".to_string()),
            category: TemplateCategory::Certificate,
            template_type: "student".to_string(),
            fields: certificate,
            layout: concat!(
                "<div class=\"certificate\"><h1>{{school_name}}</h1>",
                "<p>This certifies that {{student_name}} of Class {{class_name}} ",
                "(Roll {{roll_number}}) has achieved: {{achievement}}</p>",
                "<p>Issued on {{issue_date}}</p></div>"
            )
            .to_string(),
            credit_cost: 3,
        },
        NewTemplate {
            name: "Testimonial".to_string(),
            name_bn: Some("প্রশংসাপত্র".to_string()),
            category: TemplateCategory::Testimonial,
            template_type: "student".to_string(),
            fields: testimonial,
            layout: concat!(
                "<div class=\"testimonial\"><h1>{{school_name}}</h1>",
                "<p>{{student_name}}, child of {{father_name}}, studied in Class {{class_name}} ",
                "(Roll {{roll_number}}) and passed in {{passing_year}}.</p>",
                "<p>Issued on {{issue_date}}</p></div>"
            )
            .to_string(),
            credit_cost: 3,
        },
        NewTemplate {
            name: "Academic Transcript".to_string(),
            name_bn: Some("একাডেমিক ট্রান্সক্রিপ্ট".to_string()),
            category: TemplateCategory::Transcript,
            template_type: "student".to_string(),
            fields: transcript,
            layout: concat!(
                "<div class=\"transcript\"><h1>{{school_name}}</h1><h2>{{exam_name}}</h2>",
                "<p>{{student_name}}, Class {{class_name}}, Roll {{roll_number}}</p>",
                "<pre>{{subjects}}</pre><p>GPA: {{gpa}}</p></div>"
            )
            .to_string(),
            credit_cost: 5,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_service::document::renderer;

    #[test]
    fn test_layouts_only_reference_declared_fields() {
        for template in default_templates() {
            let names: HashSet<&str> = template.fields.iter().map(|f| f.name.as_str()).collect();
            for placeholder in renderer::placeholders(&template.layout) {
                assert!(
                    names.contains(placeholder.as_str()),
                    "{} references unknown field {}",
                    template.name,
                    placeholder
                );
            }
        }
    }

    #[test]
    fn test_template_names_are_unique() {
        let templates = default_templates();
        let names: HashSet<&str> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), templates.len());
    }
}
