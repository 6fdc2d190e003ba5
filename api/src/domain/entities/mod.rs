//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod record;
pub mod user;

pub use record::{NewRecord, Page, Record, RecordChanges, RecordId, RecordQuery, SortOrder};
pub use user::{NewUser, Role, User, UserChanges, UserId};
