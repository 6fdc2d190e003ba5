//! Record domain entity
//!
//! A single row of any content resource (FAQ entry, announcement, gallery
//! album, ...). The field document is validated against the resource schema
//! before it is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique identifier for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored resource record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    /// Resource name from the registry, e.g. `announcement`
    pub resource: String,
    pub category: Option<String>,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Every file path referenced by the record's `Files` fields
    pub fn file_paths<'a>(&'a self, file_fields: &'a [&'a str]) -> Vec<&'a str> {
        file_fields
            .iter()
            .filter_map(|field| self.data.get(*field))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .collect()
    }
}

/// Data needed to create a new record
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub resource: String,
    pub category: Option<String>,
    pub data: Map<String, Value>,
}

/// Replacement contents for an existing record
#[derive(Debug, Clone)]
pub struct RecordChanges {
    pub category: Option<String>,
    pub data: Map<String, Value>,
}

/// Sort direction for listings, by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters and paging for a record listing
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub resource: String,
    pub category: Option<String>,
    /// Equality filters on boolean fields
    pub flags: Vec<(String, bool)>,
    pub limit: u64,
    pub offset: u64,
    pub order: SortOrder,
}

impl RecordQuery {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;
    /// Postgres takes OFFSET as a signed 64-bit value
    pub const MAX_OFFSET: u64 = i64::MAX as u64;

    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            category: None,
            flags: Vec::new(),
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
            order: SortOrder::Desc,
        }
    }

    /// Whether a record satisfies the category and flag filters
    pub fn matches(&self, record: &Record) -> bool {
        record.resource == self.resource
            && self
                .category
                .as_ref()
                .map_or(true, |c| record.category.as_ref() == Some(c))
            && self
                .flags
                .iter()
                .all(|(field, want)| record.data.get(field).and_then(Value::as_bool) == Some(*want))
    }
}

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
