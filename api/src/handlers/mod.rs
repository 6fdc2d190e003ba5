//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod auth;
pub mod meta;
pub mod payload;
pub mod resources;
pub mod users;

pub use auth::{change_password, login, me, refresh};
pub use meta::{get_resource, health, list_resources};
pub use resources::{
    create_in_category, create_record, delete_in_category, delete_record, get_in_category,
    get_segment, list_records, update_in_category, update_record,
};
pub use users::{create_user, delete_user, list_users, update_user};
