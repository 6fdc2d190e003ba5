//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;

use crate::domain::entities::{
    NewRecord, NewUser, Page, Record, RecordChanges, RecordId, RecordQuery, Role, User,
    UserChanges, UserId,
};
use crate::error::DomainError;

/// Repository for resource records of every resource type
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// List records matching a query, newest first unless asked otherwise
    async fn find(&self, query: &RecordQuery) -> Result<Page<Record>, DomainError>;

    /// Find a record of a given resource by ID
    async fn find_by_id(&self, resource: &str, id: &RecordId)
        -> Result<Option<Record>, DomainError>;

    /// Find a record whose string field equals `value`
    async fn find_by_field(
        &self,
        resource: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Record>, DomainError>;

    /// Create a new record
    async fn create(&self, record: &NewRecord) -> Result<Record, DomainError>;

    /// Replace a record's category and data, bumping `updated_at`
    async fn update(&self, id: &RecordId, changes: &RecordChanges) -> Result<Record, DomainError>;

    /// Delete a record. Returns false if it did not exist.
    async fn delete(&self, id: &RecordId) -> Result<bool, DomainError>;
}

/// Repository for console users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by (lowercase) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// All users, oldest first
    async fn list(&self) -> Result<Vec<User>, DomainError>;

    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    async fn update(&self, id: &UserId, changes: &UserChanges) -> Result<User, DomainError>;

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), DomainError>;

    /// Record a successful login
    async fn touch_login(&self, id: &UserId) -> Result<(), DomainError>;

    /// Delete a user. Returns false if it did not exist.
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;

    /// Number of active users holding a role
    async fn count_active_by_role(&self, role: Role) -> Result<u64, DomainError>;
}
