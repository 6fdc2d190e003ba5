//! PostgreSQL adapter for UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::domain::entities::{NewUser, Role, User, UserChanges, UserId};
use crate::domain::ports::UserRepository;
use crate::entity::users;
use crate::error::DomainError;

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn update_error(id: &UserId, e: DbErr) -> DomainError {
    match e {
        DbErr::RecordNotUpdated => DomainError::NotFound(format!("User {}", id)),
        e => DomainError::Database(e.to_string()),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let results = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            role: Set(user.role.to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now().fixed_offset()),
            last_login_at: Set(None),
        };

        let result = model.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            )),
            _ => DomainError::Database(e.to_string()),
        })?;

        Ok(result.into())
    }

    async fn update(&self, id: &UserId, changes: &UserChanges) -> Result<User, DomainError> {
        if changes.name.is_none() && changes.role.is_none() && changes.is_active.is_none() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| DomainError::NotFound(format!("User {}", id)));
        }

        let mut model = users::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };
        if let Some(name) = &changes.name {
            model.name = Set(name.clone());
        }
        if let Some(role) = changes.role {
            model.role = Set(role.to_string());
        }
        if let Some(is_active) = changes.is_active {
            model.is_active = Set(is_active);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| update_error(id, e))?;

        Ok(result.into())
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            password_hash: Set(password_hash.to_string()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| update_error(id, e))?;

        Ok(())
    }

    async fn touch_login(&self, id: &UserId) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            last_login_at: Set(Some(Utc::now().fixed_offset())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| update_error(id, e))?;

        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = users::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn count_active_by_role(&self, role: Role) -> Result<u64, DomainError> {
        users::Entity::find()
            .filter(users::Column::Role.eq(role.to_string()))
            .filter(users::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }
}

/// Convert SeaORM model to domain entity
impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: UserId(model.id),
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            role: model.role.parse().unwrap_or(Role::Editor),
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            last_login_at: model.last_login_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
