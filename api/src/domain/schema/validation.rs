//! Field validation against a resource schema

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::{FieldKind, FieldSpec, ResourceSchema};
use crate::domain::ports::UPLOAD_PATH_PREFIX;
use crate::error::DomainError;

const LONG_TEXT_MAX: usize = 100_000;
const MAX_FILES_PER_FIELD: usize = 50;
const CATEGORY_MAX: usize = 64;

/// Key used in request bodies to select a category; never stored in `data`
pub const CATEGORY_KEY: &str = "category";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every problem found in one payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation(errors.to_string())
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"))
}

pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value)
}

fn is_http_url(value: &str) -> bool {
    (value.starts_with("http://") || value.starts_with("https://"))
        && value.len() > "https://".len()
        && !value.chars().any(char::is_whitespace)
}

fn is_file_reference(value: &str) -> bool {
    (value.starts_with(UPLOAD_PATH_PREFIX) && !value.contains("..")) || is_http_url(value)
}

/// Validate a single present, non-null value.
///
/// `Ok(None)` means the value is blank and the key should be dropped.
fn validate_value(spec: &FieldSpec, value: &Value) -> Result<Option<Value>, String> {
    let as_text = |value: &Value| -> Result<String, String> {
        value
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| "must be a string".to_string())
    };
    let blank = || {
        if spec.required {
            Err("must not be empty".to_string())
        } else {
            Ok(None)
        }
    };

    match spec.kind {
        FieldKind::Text { max } => {
            let text = as_text(value)?;
            if text.is_empty() {
                return blank();
            }
            if text.chars().count() > max {
                return Err(format!("must be at most {} characters", max));
            }
            Ok(Some(Value::String(text)))
        }
        FieldKind::LongText => {
            let text = as_text(value)?;
            if text.is_empty() {
                return blank();
            }
            if text.chars().count() > LONG_TEXT_MAX {
                return Err(format!("must be at most {} characters", LONG_TEXT_MAX));
            }
            Ok(Some(Value::String(text)))
        }
        FieldKind::Email => {
            let text = as_text(value)?.to_lowercase();
            if text.is_empty() {
                return blank();
            }
            if !is_valid_email(&text) {
                return Err("must be a valid email address".to_string());
            }
            Ok(Some(Value::String(text)))
        }
        FieldKind::Url => {
            let text = as_text(value)?;
            if text.is_empty() {
                return blank();
            }
            if !is_http_url(&text) {
                return Err("must be an http(s) URL".to_string());
            }
            Ok(Some(Value::String(text)))
        }
        FieldKind::Date => {
            let text = as_text(value)?;
            if text.is_empty() {
                return blank();
            }
            NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map_err(|_| "must be a date in YYYY-MM-DD format".to_string())?;
            Ok(Some(Value::String(text)))
        }
        FieldKind::Bool => value
            .as_bool()
            .map(|b| Some(Value::Bool(b)))
            .ok_or_else(|| "must be true or false".to_string()),
        FieldKind::Integer { min, max } => {
            let n = value
                .as_i64()
                .ok_or_else(|| "must be a whole number".to_string())?;
            if n < min || n > max {
                return Err(format!("must be between {} and {}", min, max));
            }
            Ok(Some(Value::Number(n.into())))
        }
        FieldKind::Number { min } => {
            let n = value
                .as_f64()
                .filter(|n| n.is_finite())
                .ok_or_else(|| "must be a number".to_string())?;
            if n < min {
                return Err(format!("must be at least {}", min));
            }
            Ok(Number::from_f64(n).map(Value::Number))
        }
        FieldKind::Choice { options } => {
            let text = as_text(value)?;
            if text.is_empty() {
                return blank();
            }
            if !options.contains(&text.as_str()) {
                return Err(format!("must be one of: {}", options.join(", ")));
            }
            Ok(Some(Value::String(text)))
        }
        FieldKind::Files => {
            let items = value
                .as_array()
                .ok_or_else(|| "must be a list of files".to_string())?;
            if items.len() > MAX_FILES_PER_FIELD {
                return Err(format!("must have at most {} files", MAX_FILES_PER_FIELD));
            }
            let mut paths = Vec::with_capacity(items.len());
            for item in items {
                let path = item
                    .as_str()
                    .map(str::trim)
                    .filter(|p| is_file_reference(p))
                    .ok_or_else(|| "must contain upload paths or http(s) URLs".to_string())?;
                paths.push(Value::String(path.to_string()));
            }
            if paths.is_empty() {
                return if spec.required {
                    Err("must contain at least one file".to_string())
                } else {
                    Ok(Some(Value::Array(paths)))
                };
            }
            Ok(Some(Value::Array(paths)))
        }
    }
}

fn as_object<'a>(input: &'a Value) -> Result<&'a Map<String, Value>, ValidationErrors> {
    input
        .as_object()
        .ok_or_else(|| ValidationErrors::single("body", "must be a JSON object"))
}

fn check_unknown_keys(
    schema: &ResourceSchema,
    input: &Map<String, Value>,
    errors: &mut ValidationErrors,
) {
    for key in input.keys() {
        if key != CATEGORY_KEY && schema.field(key).is_none() {
            errors.push(key, "unknown field");
        }
    }
}

/// Validate a full document for a new record.
pub fn validate_create(
    schema: &ResourceSchema,
    input: &Value,
) -> Result<Map<String, Value>, ValidationErrors> {
    let input = as_object(input)?;
    let mut errors = ValidationErrors::default();
    check_unknown_keys(schema, input, &mut errors);

    let mut data = Map::new();
    for spec in schema.fields {
        match input.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.kind == FieldKind::Bool {
                    data.insert(spec.name.to_string(), Value::Bool(false));
                } else if spec.required {
                    errors.push(spec.name, "is required");
                }
            }
            Some(value) => match validate_value(spec, value) {
                Ok(Some(v)) => {
                    data.insert(spec.name.to_string(), v);
                }
                Ok(None) => {}
                Err(message) => errors.push(spec.name, message),
            },
        }
    }

    errors.into_result(data)
}

/// Validate a partial document and merge it over `existing`.
pub fn validate_update(
    schema: &ResourceSchema,
    existing: &Map<String, Value>,
    patch: &Value,
) -> Result<Map<String, Value>, ValidationErrors> {
    let patch = as_object(patch)?;
    let mut errors = ValidationErrors::default();
    check_unknown_keys(schema, patch, &mut errors);

    let mut merged = existing.clone();
    for (key, value) in patch {
        let Some(spec) = schema.field(key) else {
            continue;
        };
        if value.is_null() {
            if spec.required {
                errors.push(key, "is required");
            } else {
                merged.remove(key);
            }
            continue;
        }
        match validate_value(spec, value) {
            Ok(Some(v)) => {
                merged.insert(key.clone(), v);
            }
            Ok(None) => {
                merged.remove(key);
            }
            Err(message) => errors.push(key, message),
        }
    }

    errors.into_result(merged)
}

/// Convert a multipart text part to the JSON type of its field.
///
/// Text that does not parse is passed through unchanged so that validation
/// can report it.
pub fn coerce_form_value(kind: &FieldKind, text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    match kind {
        FieldKind::Bool => match trimmed.to_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => Value::Bool(true),
            "false" | "off" | "0" | "no" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        FieldKind::Integer { .. } => trimmed
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|_| Value::String(text.to_string())),
        FieldKind::Number { .. } => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        _ => Value::String(text.to_string()),
    }
}

/// Normalize and check a category slug.
pub fn validate_category(text: &str) -> Result<String, ValidationErrors> {
    let slug = text.trim().to_lowercase();
    if slug.is_empty() || slug.len() > CATEGORY_MAX || !slug_regex().is_match(&slug) {
        return Err(ValidationErrors::single(
            CATEGORY_KEY,
            format!(
                "must be a lowercase slug of at most {} characters",
                CATEGORY_MAX
            ),
        ));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::find;
    use serde_json::json;

    fn field_names(errors: &ValidationErrors) -> Vec<&str> {
        errors.0.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn create_accepts_valid_faq() {
        let faq = find("faq").unwrap();
        let data = validate_create(
            faq,
            &json!({"question": "  When does term start? ", "answer": "In April."}),
        )
        .unwrap();

        assert_eq!(data["question"], "When does term start?");
        assert_eq!(data["answer"], "In April.");
        assert!(!data.contains_key("displayOrder"));
    }

    #[test]
    fn create_reports_every_missing_required_field() {
        let career = find("career").unwrap();
        let errors = validate_create(career, &json!({})).unwrap_err();

        let fields = field_names(&errors);
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"description"));
        assert!(fields.contains(&"date"));
        assert!(!fields.contains(&"files"));
    }

    #[test]
    fn create_rejects_unknown_fields() {
        let faq = find("faq").unwrap();
        let errors = validate_create(
            faq,
            &json!({"question": "Q", "answer": "A", "isAdmin": true}),
        )
        .unwrap_err();

        assert_eq!(field_names(&errors), vec!["isAdmin"]);
        assert_eq!(errors.0[0].message, "unknown field");
    }

    #[test]
    fn create_rejects_non_object_body() {
        let faq = find("faq").unwrap();
        let errors = validate_create(faq, &json!(["question"])).unwrap_err();
        assert_eq!(field_names(&errors), vec!["body"]);
    }

    #[test]
    fn create_defaults_bool_fields_to_false() {
        let announcement = find("announcement").unwrap();
        let data = validate_create(
            announcement,
            &json!({"title": "Holiday", "date": "2026-01-01"}),
        )
        .unwrap();

        assert_eq!(data["isHeadline"], false);
    }

    #[test]
    fn create_checks_types_and_formats() {
        let announcement = find("announcement").unwrap();
        let errors = validate_create(
            announcement,
            &json!({
                "title": 42,
                "date": "01/02/2026",
                "isHeadline": "yes",
                "files": ["/etc/passwd"]
            }),
        )
        .unwrap_err();

        let fields = field_names(&errors);
        assert_eq!(fields.len(), 4);
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"date"));
        assert!(fields.contains(&"isHeadline"));
        assert!(fields.contains(&"files"));
    }

    #[test]
    fn create_enforces_text_limits_and_blank_required() {
        let faq = find("faq").unwrap();
        let long = "x".repeat(501);
        let errors = validate_create(faq, &json!({"question": long, "answer": "   "})).unwrap_err();

        assert_eq!(errors.0.len(), 2);
        assert!(errors.0.iter().any(|e| e.message.contains("at most 500")));
        assert!(errors.0.iter().any(|e| e.message == "must not be empty"));
    }

    #[test]
    fn create_checks_numbers_and_choices() {
        let donation = find("donation").unwrap();
        let errors = validate_create(
            donation,
            &json!({"name": "Parent", "email": "not-an-email", "amount": 0}),
        )
        .unwrap_err();
        let fields = field_names(&errors);
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"amount"));

        let membership = find("membership").unwrap();
        let errors = validate_create(
            membership,
            &json!({
                "fullName": "A Parent",
                "email": "parent@home.test",
                "phone": "555-0100",
                "membershipType": "platinum"
            }),
        )
        .unwrap_err();
        assert_eq!(field_names(&errors), vec!["membershipType"]);
    }

    #[test]
    fn create_lowercases_emails() {
        let contact = find("contact").unwrap();
        let data = validate_create(
            contact,
            &json!({
                "name": "Visitor",
                "email": "Visitor@Example.COM",
                "subject": "Admissions",
                "message": "Hello"
            }),
        )
        .unwrap();
        assert_eq!(data["email"], "visitor@example.com");
    }

    #[test]
    fn create_allows_category_key_in_body() {
        let notice = find("notice").unwrap();
        let data = validate_create(
            notice,
            &json!({"title": "Exam", "date": "2026-03-01", "category": "exams"}),
        )
        .unwrap();
        assert!(!data.contains_key("category"));
    }

    #[test]
    fn update_merges_partial_patch() {
        let faq = find("faq").unwrap();
        let existing = validate_create(
            faq,
            &json!({"question": "Q", "answer": "A", "displayOrder": 3}),
        )
        .unwrap();

        let merged = validate_update(faq, &existing, &json!({"answer": "B"})).unwrap();
        assert_eq!(merged["question"], "Q");
        assert_eq!(merged["answer"], "B");
        assert_eq!(merged["displayOrder"], 3);
    }

    #[test]
    fn update_null_clears_optional_and_rejects_required() {
        let faq = find("faq").unwrap();
        let existing = validate_create(
            faq,
            &json!({"question": "Q", "answer": "A", "displayOrder": 3}),
        )
        .unwrap();

        let merged = validate_update(faq, &existing, &json!({"displayOrder": null})).unwrap();
        assert!(!merged.contains_key("displayOrder"));

        let errors = validate_update(faq, &existing, &json!({"question": null})).unwrap_err();
        assert_eq!(field_names(&errors), vec!["question"]);
    }

    #[test]
    fn required_files_must_not_be_empty() {
        let gallery = find("gallery").unwrap();
        let errors =
            validate_create(gallery, &json!({"title": "Sports day", "files": []})).unwrap_err();
        assert_eq!(errors.0[0].message, "must contain at least one file");

        let data = validate_create(
            gallery,
            &json!({"title": "Sports day", "files": ["/uploads/a.jpg", "https://cdn.test/b.jpg"]}),
        )
        .unwrap();
        assert_eq!(data["files"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn coerce_form_values_by_kind() {
        assert_eq!(coerce_form_value(&FieldKind::Bool, "on"), json!(true));
        assert_eq!(coerce_form_value(&FieldKind::Bool, "false"), json!(false));
        assert_eq!(
            coerce_form_value(&FieldKind::Integer { min: 0, max: 10 }, " 7 "),
            json!(7)
        );
        assert_eq!(
            coerce_form_value(&FieldKind::Number { min: 0.0 }, "12.5"),
            json!(12.5)
        );
        assert_eq!(
            coerce_form_value(&FieldKind::Integer { min: 0, max: 10 }, "seven"),
            json!("seven")
        );
        assert_eq!(coerce_form_value(&FieldKind::LongText, "  "), Value::Null);
        assert_eq!(coerce_form_value(&FieldKind::LongText, "hi"), json!("hi"));
    }

    #[test]
    fn category_slugs() {
        assert_eq!(validate_category(" Primary-School ").unwrap(), "primary-school");
        assert!(validate_category("").is_err());
        assert!(validate_category("two words").is_err());
        assert!(validate_category("trailing-").is_err());
        assert!(validate_category(&"a".repeat(65)).is_err());
    }

    #[test]
    fn errors_display_lists_fields() {
        let mut errors = ValidationErrors::default();
        errors.push("title", "is required");
        errors.push("date", "must be a date in YYYY-MM-DD format");
        assert_eq!(
            errors.to_string(),
            "title: is required; date: must be a date in YYYY-MM-DD format"
        );
    }
}
