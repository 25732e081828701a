//! Request field validation and free-text sanitization helpers.

use validator::{ValidationError, ValidationErrors};

use crate::error::FieldErrors;

/// Flattens `validator` output into one reason per field.
pub fn format_validation_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut formatted = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
        if let Some(first) = field_errors.first() {
            formatted.insert(field.to_string(), describe(&field, first));
        }
    }
    formatted
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match error.code.as_ref() {
        "required" => format!("{} is required", field),
        "email" => "Invalid email format".to_string(),
        "length" => {
            let value_len = error
                .params
                .get("value")
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count())
                .unwrap_or(0);
            let min = error.params.get("min").and_then(|v| v.as_u64());
            match min {
                Some(_) if value_len == 0 => format!("{} is required", field),
                Some(min) if (value_len as u64) < min => format!("{} is too short", field),
                _ => format!("{} is too long", field),
            }
        }
        "range" => match (error.params.get("min"), error.params.get("max")) {
            (Some(min), Some(max)) => format!("{} must be between {} and {}", field, min, max),
            (Some(min), None) => format!("{} must be at least {}", field, min),
            (None, Some(max)) => format!("{} must be at most {}", field, max),
            (None, None) => format!("{} is out of range", field),
        },
        _ => format!("{} is invalid", field),
    }
}

/// HTML-escape the five characters that matter in markup and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Rejects values that are empty once trimmed. Reported like a missing field.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Trim then escape user-supplied free text before it is persisted.
pub fn sanitize_text(input: &str) -> String {
    escape_html(input.trim())
}
