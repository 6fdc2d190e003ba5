//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod mail;
pub mod postgres;
pub mod storage;

pub use mail::OutboxMailer;
pub use postgres::{bootstrap_schema, PostgresRecordRepository, PostgresUserRepository};
pub use storage::LocalUploadStore;
