//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::app::password::hash_password;
use crate::domain::entities::{Record, RecordId, Role, User, UserId};
use crate::domain::ports::UploadedFile;

/// Smallest valid PNG: 1x1 transparent pixel
pub const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Create an active editor with default values
pub fn test_user() -> User {
    User {
        id: UserId(Uuid::new_v4()),
        name: "Test Editor".to_string(),
        email: "editor@school.test".to_string(),
        password_hash: "$2b$04$not-a-real-hash".to_string(),
        role: Role::Editor,
        is_active: true,
        created_at: Utc::now(),
        last_login_at: None,
    }
}

/// Create an active admin with default values
pub fn test_admin() -> User {
    User {
        name: "Test Admin".to_string(),
        email: "admin@school.test".to_string(),
        role: Role::Admin,
        ..test_user()
    }
}

/// Create an editor whose password hash really matches `password`
pub async fn test_user_with_password(email: &str, password: &str, cost: u32) -> User {
    User {
        email: email.to_string(),
        password_hash: hash_password(password, cost)
            .await
            .expect("hashing a test password"),
        ..test_user()
    }
}

/// Create a stored record of `resource` from a JSON object
pub fn test_record(resource: &str, category: Option<&str>, data: Value) -> Record {
    let now = Utc::now();
    Record {
        id: RecordId(Uuid::new_v4()),
        resource: resource.to_string(),
        category: category.map(str::to_string),
        data: data.as_object().cloned().unwrap_or_else(Map::new),
        created_at: now,
        updated_at: now,
    }
}

/// A small PNG upload sent under form field `field`
pub fn test_png(field: &str) -> UploadedFile {
    UploadedFile {
        field: field.to_string(),
        filename: "pixel.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: PNG_PIXEL.to_vec(),
    }
}
