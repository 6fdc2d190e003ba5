//! PostgreSQL adapter for RecordRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::entities::{
    NewRecord, Page, Record, RecordChanges, RecordId, RecordQuery, SortOrder,
};
use crate::domain::ports::RecordRepository;
use crate::entity::records;
use crate::error::DomainError;

/// PostgreSQL implementation of RecordRepository
pub struct PostgresRecordRepository {
    db: DatabaseConnection,
}

impl PostgresRecordRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// `data ->> field = value`
fn data_field_eq(field: &str, value: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::cust_with_values(
        "data ->> $1 = $2",
        [field.to_string(), value.to_string()],
    )
}

#[async_trait]
impl RecordRepository for PostgresRecordRepository {
    async fn find(&self, query: &RecordQuery) -> Result<Page<Record>, DomainError> {
        let mut select =
            records::Entity::find().filter(records::Column::Resource.eq(query.resource.as_str()));

        if let Some(category) = &query.category {
            select = select.filter(records::Column::Category.eq(category.as_str()));
        }
        for (field, flag) in &query.flags {
            select = select.filter(data_field_eq(field, if *flag { "true" } else { "false" }));
        }

        let total = select
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let select = match query.order {
            SortOrder::Asc => select
                .order_by_asc(records::Column::CreatedAt)
                .order_by_asc(records::Column::Id),
            SortOrder::Desc => select
                .order_by_desc(records::Column::CreatedAt)
                .order_by_desc(records::Column::Id),
        };

        let results = select
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(Page {
            items: results.into_iter().map(|m| m.into()).collect(),
            total,
        })
    }

    async fn find_by_id(
        &self,
        resource: &str,
        id: &RecordId,
    ) -> Result<Option<Record>, DomainError> {
        let result = records::Entity::find_by_id(id.0)
            .filter(records::Column::Resource.eq(resource))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_field(
        &self,
        resource: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Record>, DomainError> {
        let result = records::Entity::find()
            .filter(records::Column::Resource.eq(resource))
            .filter(data_field_eq(field, value))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create(&self, record: &NewRecord) -> Result<Record, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = records::ActiveModel {
            id: Set(Uuid::new_v4()),
            resource: Set(record.resource.clone()),
            category: Set(record.category.clone()),
            data: Set(Value::Object(record.data.clone())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update(&self, id: &RecordId, changes: &RecordChanges) -> Result<Record, DomainError> {
        let result = records::ActiveModel {
            id: Set(id.0),
            category: Set(changes.category.clone()),
            data: Set(Value::Object(changes.data.clone())),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| match e {
            DbErr::RecordNotUpdated => DomainError::NotFound(format!("Record {}", id)),
            e => DomainError::Database(e.to_string()),
        })?;

        Ok(result.into())
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, DomainError> {
        let result = records::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

/// Convert SeaORM model to domain entity
impl From<records::Model> for Record {
    fn from(model: records::Model) -> Self {
        let data = match model.data {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Record {
            id: RecordId(model.id),
            resource: model.resource,
            category: model.category,
            data,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
