//! Resource schemas
//!
//! Every content resource is described by a static `ResourceSchema`: its
//! fields, whether it is split into categories, who may read or write it, and
//! which fields the public website may see. The shared CRUD service is driven
//! entirely by these descriptions.

pub mod registry;
pub mod validation;

use serde::Serialize;
use serde_json::{Map, Value};

pub use registry::{all, find};
pub use validation::{coerce_form_value, validate_category, validate_create, validate_update};

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    /// Single-line text with a character limit
    Text { max: usize },
    LongText,
    Email,
    /// Absolute http(s) URL
    Url,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    Bool,
    Integer { min: i64, max: i64 },
    Number { min: f64 },
    Choice { options: &'static [&'static str] },
    /// List of stored upload paths or external URLs
    Files,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    /// No two records of the resource may share this value
    pub unique: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            unique: false,
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }
}

/// Whether records of a resource live in categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryRule {
    None,
    Required,
}

/// Field-inclusion map used to shape returned JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Only(&'static [&'static str]),
}

impl Selection {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(fields) => fields.contains(&field),
        }
    }

    pub fn apply(&self, data: &Map<String, Value>) -> Map<String, Value> {
        data.iter()
            .filter(|(key, _)| self.includes(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Who is looking at a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Anonymous website visitor
    Public,
    /// Signed-in console user
    Staff,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSchema {
    pub name: &'static str,
    pub label: &'static str,
    pub category: CategoryRule,
    pub fields: &'static [FieldSpec],
    pub public_read: bool,
    pub public_create: bool,
    pub admin_only_write: bool,
    #[serde(skip)]
    pub public_fields: Selection,
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_categorized(&self) -> bool {
        self.category == CategoryRule::Required
    }

    pub fn file_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Files)
            .map(|f| f.name)
            .collect()
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.unique)
    }

    pub fn selection_for(&self, audience: Audience) -> Selection {
        match audience {
            Audience::Public => self.public_fields,
            Audience::Staff => Selection::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selection_only_keeps_listed_fields() {
        let data = json!({"name": "A", "email": "a@b.c", "amount": 10})
            .as_object()
            .cloned()
            .unwrap();

        let selected = Selection::Only(&["name", "amount"]).apply(&data);
        assert_eq!(selected.len(), 2);
        assert!(selected.contains_key("name"));
        assert!(!selected.contains_key("email"));

        assert_eq!(Selection::All.apply(&data), data);
    }

    #[test]
    fn donation_hides_contact_details_from_public() {
        let donation = find("donation").unwrap();
        let public = donation.selection_for(Audience::Public);
        assert!(!public.includes("email"));
        assert!(!public.includes("phone"));
        assert!(public.includes("amount"));
        assert!(donation.selection_for(Audience::Staff).includes("email"));
    }

    #[test]
    fn field_spec_builders() {
        let spec = FieldSpec::new("key", "Key", FieldKind::Text { max: 10 })
            .required()
            .unique();
        assert!(spec.required);
        assert!(spec.unique);
    }

    #[test]
    fn schema_serializes_for_admin_console() {
        let faq = find("faq").unwrap();
        let json = serde_json::to_value(faq).unwrap();

        assert_eq!(json["name"], "faq");
        assert_eq!(json["category"], "none");
        assert_eq!(json["fields"][0]["name"], "question");
        assert_eq!(json["fields"][0]["type"], "text");
        assert_eq!(json["fields"][0]["max"], 500);
        assert!(json.get("publicFields").is_none());
    }

    #[test]
    fn file_fields_are_listed() {
        let faculty = find("faculty").unwrap();
        assert_eq!(faculty.file_fields(), vec!["photo"]);
        assert!(find("faq").unwrap().file_fields().is_empty());
    }
}
