//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::domain::entities::{
    NewRecord, NewUser, Page, Record, RecordChanges, RecordId, RecordQuery, Role, SortOrder, User,
    UserChanges, UserId,
};
use crate::domain::ports::{
    extension_for, MailMessage, Mailer, RecordRepository, UploadStore, UploadedFile,
    UserRepository,
};
use crate::error::{DomainError, MailError, UploadError};

// ============================================================================
// In-Memory Record Repository
// ============================================================================

/// Records kept in insertion order, which doubles as creation order
#[derive(Default)]
pub struct InMemoryRecordRepository {
    records: Arc<RwLock<Vec<Record>>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a record for testing
    pub fn with_record(self, record: Record) -> Self {
        self.records.write().unwrap().push(record);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn find(&self, query: &RecordQuery) -> Result<Page<Record>, DomainError> {
        let records = self.records.read().unwrap();
        let mut matching: Vec<Record> = records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        if query.order == SortOrder::Desc {
            matching.reverse();
        }

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();

        Ok(Page { items, total })
    }

    async fn find_by_id(
        &self,
        resource: &str,
        id: &RecordId,
    ) -> Result<Option<Record>, DomainError> {
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .find(|r| r.id == *id && r.resource == resource)
            .cloned())
    }

    async fn find_by_field(
        &self,
        resource: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Record>, DomainError> {
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .find(|r| {
                r.resource == resource
                    && r.data.get(field).and_then(|v| v.as_str()) == Some(value)
            })
            .cloned())
    }

    async fn create(&self, new_record: &NewRecord) -> Result<Record, DomainError> {
        let now = Utc::now();
        let record = Record {
            id: RecordId(Uuid::new_v4()),
            resource: new_record.resource.clone(),
            category: new_record.category.clone(),
            data: new_record.data.clone(),
            created_at: now,
            updated_at: now,
        };

        self.records.write().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &RecordId, changes: &RecordChanges) -> Result<Record, DomainError> {
        let mut records = self.records.write().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Record {}", id)))?;

        record.category = changes.category.clone();
        record.data = changes.data.clone();
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, DomainError> {
        let mut records = self.records.write().unwrap();
        let before = records.len();
        records.retain(|r| r.id != *id);
        Ok(records.len() < before)
    }
}

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }

    fn modify(&self, id: &UserId, apply: impl FnOnce(&mut User)) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)))?;
        apply(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().unwrap();
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                new_user.email
            )));
        }

        let user = User {
            id: UserId(Uuid::new_v4()),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
            is_active: true,
            created_at: Utc::now(),
            last_login_at: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: &UserId, changes: &UserChanges) -> Result<User, DomainError> {
        self.modify(id, |user| {
            if let Some(name) = &changes.name {
                user.name = name.clone();
            }
            if let Some(role) = changes.role {
                user.role = role;
            }
            if let Some(is_active) = changes.is_active {
                user.is_active = is_active;
            }
        })
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), DomainError> {
        self.modify(id, |user| user.password_hash = password_hash.to_string())?;
        Ok(())
    }

    async fn touch_login(&self, id: &UserId) -> Result<(), DomainError> {
        self.modify(id, |user| user.last_login_at = Some(Utc::now()))?;
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        Ok(self.users.write().unwrap().remove(id).is_some())
    }

    async fn count_active_by_role(&self, role: Role) -> Result<u64, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .filter(|u| u.role == role && u.is_active)
            .count() as u64)
    }
}

// ============================================================================
// In-Memory Upload Store
// ============================================================================

#[derive(Default)]
pub struct InMemoryUploadStore {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryUploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_count(&self) -> usize {
        self.files.read().unwrap().len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.read().unwrap().contains_key(path)
    }
}

#[async_trait]
impl UploadStore for InMemoryUploadStore {
    async fn store(&self, file: &UploadedFile) -> Result<String, UploadError> {
        let ext = extension_for(&file.content_type)
            .ok_or_else(|| UploadError::UnsupportedType(file.content_type.clone()))?;
        let path = format!("/uploads/{}.{}", Uuid::new_v4(), ext);
        self.files
            .write()
            .unwrap()
            .insert(path.clone(), file.bytes.clone());
        Ok(path)
    }

    async fn remove(&self, path: &str) -> Result<(), UploadError> {
        self.files.write().unwrap().remove(path);
        Ok(())
    }
}

// ============================================================================
// Mailers
// ============================================================================

/// Keeps every sent message for inspection
#[derive(Default)]
pub struct RecordingMailer {
    sent: Arc<RwLock<Vec<MailMessage>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent.write().unwrap().push(message.clone());
        Ok(())
    }
}

/// Always fails, as if the spool directory were unwritable
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &MailMessage) -> Result<(), MailError> {
        Err(MailError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "outbox not writable",
        )))
    }
}
