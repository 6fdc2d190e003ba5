//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod record_repo;
pub mod user_repo;


use sea_orm::{ConnectionTrait, DatabaseConnection};

pub use record_repo::PostgresRecordRepository;
pub use user_repo::PostgresUserRepository;

use crate::error::DomainError;

const INIT_SQL: &str = include_str!("../../../migrations/0001_init.sql");

/// Create tables and indexes if they do not exist yet
pub async fn bootstrap_schema(db: &DatabaseConnection) -> Result<(), DomainError> {
    tracing::info!("Applying database schema");

    db.execute_unprepared(INIT_SQL)
        .await
        .map_err(|e| DomainError::Database(format!("Failed to apply schema: {}", e)))?;

    Ok(())
}
