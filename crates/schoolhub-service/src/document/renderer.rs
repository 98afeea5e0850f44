//! Fills `{{field}}` placeholders in a template layout.

use serde_json::Value;

use schoolhub_core::error::AppError;

/// Render `layout`, replacing each `{{ name }}` with the HTML-escaped
/// value of `input[name]`. Missing or null values render as empty.
pub fn render(layout: &str, input: &Value) -> Result<String, AppError> {
    let mut out = String::with_capacity(layout.len());
    let mut rest = layout;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let offset = layout.len() - rest.len() + start;
        let end = after.find("}}").ok_or_else(|| {
            AppError::internal(format!(
                "Template render failed: unterminated placeholder at byte {offset}"
            ))
        })?;
        let key = after[..end].trim();
        if key.is_empty() {
            return Err(AppError::internal(format!(
                "Template render failed: empty placeholder at byte {offset}"
            )));
        }
        escape_into(&mut out, &value_text(input.get(key)));
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Placeholder names used by `layout`, in order of first appearance.
/// Malformed placeholders are skipped.
pub fn placeholders(layout: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = layout;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else { break };
        let key = after[..end].trim();
        if !key.is_empty() && !names.iter().any(|n| n == key) {
            names.push(key.to_string());
        }
        rest = &after[end + 2..];
    }
    names
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fills_and_escapes() {
        let html = render(
            "<h1>{{ name }}</h1><p>Roll {{roll}}</p>",
            &json!({"name": "Rahim <b>&</b>", "roll": 12}),
        )
        .unwrap();
        assert_eq!(html, "<h1>Rahim &lt;b&gt;&amp;&lt;/b&gt;</h1><p>Roll 12</p>");
    }

    #[test]
    fn test_bengali_passes_through() {
        let html = render("{{name_bn}}", &json!({"name_bn": "রহিম"})).unwrap();
        assert_eq!(html, "রহিম");
    }

    #[test]
    fn test_missing_value_is_empty() {
        assert_eq!(render("[{{x}}]", &json!({})).unwrap(), "[]");
    }

    #[test]
    fn test_unterminated_placeholder_fails() {
        let err = render("<p>{{name</p>", &json!({"name": "x"})).unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_placeholders_are_unique() {
        assert_eq!(
            placeholders("{{a}} {{ b }} {{a}} {{"),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
