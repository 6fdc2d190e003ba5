//! Resource handlers
//!
//! One set of endpoints serves every resource in the registry. The second
//! path segment is a record id when it parses as a UUID, and a category
//! otherwise.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::app::{ListPage, ListParams, Payload};
use crate::domain::entities::{RecordId, SortOrder, User};
use crate::domain::schema::{self, ResourceSchema};
use crate::error::AppError;
use crate::AppState;

fn schema_for(resource: &str) -> Result<&'static ResourceSchema, AppError> {
    schema::find(resource)
        .ok_or_else(|| AppError::NotFound(format!("Unknown resource '{}'", resource)))
}

fn record_id(segment: &str) -> Option<RecordId> {
    Uuid::parse_str(segment).ok().map(RecordId)
}

fn require_record_id(segment: &str) -> Result<RecordId, AppError> {
    record_id(segment).ok_or_else(|| AppError::NotFound(format!("'{}' is not a record id", segment)))
}

/// Split list query parameters into paging options and field filters
fn list_params(mut query: HashMap<String, String>) -> Result<ListParams, AppError> {
    let number = |name: &str, value: String| {
        value
            .parse::<u64>()
            .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", name)))
    };

    let limit = query.remove("limit").map(|v| number("limit", v)).transpose()?;
    let offset = query.remove("offset").map(|v| number("offset", v)).transpose()?;
    let order = query
        .remove("order")
        .map(|v| match v.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::BadRequest("order must be asc or desc".to_string())),
        })
        .transpose()?;

    Ok(ListParams {
        limit,
        offset,
        order,
        filters: query,
    })
}

/// GET /api/v1/:resource
pub async fn list_records(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    user: Option<Extension<User>>,
) -> Result<Json<ListPage>, AppError> {
    let schema = schema_for(&resource)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    let page = state
        .resource_service
        .list(schema, actor, None, list_params(query)?)
        .await?;

    Ok(Json(page))
}

/// POST /api/v1/:resource
pub async fn create_record(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    user: Option<Extension<User>>,
    payload: Payload,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let schema = schema_for(&resource)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    let created = state
        .resource_service
        .create(schema, actor, None, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/:resource/:segment
///
/// A record by id, or the listing of a category.
pub async fn get_segment(
    State(state): State<AppState>,
    Path((resource, segment)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    user: Option<Extension<User>>,
) -> Result<Response, AppError> {
    let schema = schema_for(&resource)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    match record_id(&segment) {
        Some(id) => {
            let record = state.resource_service.get(schema, actor, None, &id).await?;
            Ok(Json(record).into_response())
        }
        None => {
            let page = state
                .resource_service
                .list(schema, actor, Some(&segment), list_params(query)?)
                .await?;
            Ok(Json(page).into_response())
        }
    }
}

/// POST /api/v1/:resource/:category
pub async fn create_in_category(
    State(state): State<AppState>,
    Path((resource, category)): Path<(String, String)>,
    user: Option<Extension<User>>,
    payload: Payload,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let schema = schema_for(&resource)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    let created = state
        .resource_service
        .create(schema, actor, Some(&category), payload)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/:resource/:id
pub async fn update_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    user: Option<Extension<User>>,
    payload: Payload,
) -> Result<Json<Value>, AppError> {
    let schema = schema_for(&resource)?;
    let id = require_record_id(&id)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    let updated = state
        .resource_service
        .update(schema, actor, None, &id, payload)
        .await?;

    Ok(Json(updated))
}

/// DELETE /api/v1/:resource/:id
pub async fn delete_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    user: Option<Extension<User>>,
) -> Result<StatusCode, AppError> {
    let schema = schema_for(&resource)?;
    let id = require_record_id(&id)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    state
        .resource_service
        .delete(schema, actor, None, &id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/:resource/:category/:id
pub async fn get_in_category(
    State(state): State<AppState>,
    Path((resource, category, id)): Path<(String, String, String)>,
    user: Option<Extension<User>>,
) -> Result<Json<Value>, AppError> {
    let schema = schema_for(&resource)?;
    let id = require_record_id(&id)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    let record = state
        .resource_service
        .get(schema, actor, Some(&category), &id)
        .await?;

    Ok(Json(record))
}

/// PUT /api/v1/:resource/:category/:id
pub async fn update_in_category(
    State(state): State<AppState>,
    Path((resource, category, id)): Path<(String, String, String)>,
    user: Option<Extension<User>>,
    payload: Payload,
) -> Result<Json<Value>, AppError> {
    let schema = schema_for(&resource)?;
    let id = require_record_id(&id)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    let updated = state
        .resource_service
        .update(schema, actor, Some(&category), &id, payload)
        .await?;

    Ok(Json(updated))
}

/// DELETE /api/v1/:resource/:category/:id
pub async fn delete_in_category(
    State(state): State<AppState>,
    Path((resource, category, id)): Path<(String, String, String)>,
    user: Option<Extension<User>>,
) -> Result<StatusCode, AppError> {
    let schema = schema_for(&resource)?;
    let id = require_record_id(&id)?;
    let actor = user.as_ref().map(|Extension(u)| u);

    state
        .resource_service
        .delete(schema, actor, Some(&category), &id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
