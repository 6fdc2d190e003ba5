//! Resource service
//!
//! The shared CRUD dispatcher behind every content resource. Each operation
//! is parameterized by a `ResourceSchema`: access rules, category handling,
//! field validation and the selection criteria applied to responses all come
//! from the schema.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::entities::{
    NewRecord, Record, RecordChanges, RecordId, RecordQuery, SortOrder, User,
};
use crate::domain::ports::{
    extension_for, RecordRepository, UploadStore, UploadedFile, UPLOAD_PATH_PREFIX,
};
use crate::domain::schema::validation::CATEGORY_KEY;
use crate::domain::schema::{
    coerce_form_value, validate_category, validate_create, validate_update, Audience, FieldKind,
    ResourceSchema,
};
use crate::error::{AppError, DomainError, UploadError};

/// Body of a create or update request
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Form(FormData),
}

/// Parsed `multipart/form-data` body
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

/// Paging, ordering and flag filters for a listing
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub order: Option<SortOrder>,
    /// Remaining query parameters; boolean fields of the resource act as filters
    pub filters: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    pub items: Vec<Value>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Read,
    Create,
    Write,
}

pub struct ResourceService {
    records: Arc<dyn RecordRepository>,
    uploads: Arc<dyn UploadStore>,
    max_upload_bytes: usize,
}

impl ResourceService {
    pub fn new(
        records: Arc<dyn RecordRepository>,
        uploads: Arc<dyn UploadStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            records,
            uploads,
            max_upload_bytes,
        }
    }

    pub async fn list(
        &self,
        schema: &ResourceSchema,
        actor: Option<&User>,
        category: Option<&str>,
        params: ListParams,
    ) -> Result<ListPage, AppError> {
        let audience = authorize(schema, Operation::Read, actor)?;

        let mut query = RecordQuery::new(schema.name);
        query.category = path_category(schema, category)?;
        query.limit = params
            .limit
            .unwrap_or(RecordQuery::DEFAULT_LIMIT)
            .clamp(1, RecordQuery::MAX_LIMIT);
        query.offset = params.offset.unwrap_or(0);
        if query.offset > RecordQuery::MAX_OFFSET {
            return Err(AppError::BadRequest(format!(
                "offset must be at most {}",
                RecordQuery::MAX_OFFSET
            )));
        }
        query.order = params.order.unwrap_or_default();

        for (name, value) in &params.filters {
            let Some(spec) = schema.field(name) else {
                continue;
            };
            if spec.kind != FieldKind::Bool {
                continue;
            }
            let flag = value.parse::<bool>().map_err(|_| {
                AppError::BadRequest(format!("filter '{}' must be true or false", name))
            })?;
            query.flags.push((name.clone(), flag));
        }

        let page = self.records.find(&query).await?;

        Ok(ListPage {
            items: page
                .items
                .iter()
                .map(|r| render(schema, r, audience))
                .collect(),
            total: page.total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    pub async fn get(
        &self,
        schema: &ResourceSchema,
        actor: Option<&User>,
        category: Option<&str>,
        id: &RecordId,
    ) -> Result<Value, AppError> {
        let audience = authorize(schema, Operation::Read, actor)?;
        let record = self.load(schema, category, id).await?;
        Ok(render(schema, &record, audience))
    }

    pub async fn create(
        &self,
        schema: &ResourceSchema,
        actor: Option<&User>,
        category: Option<&str>,
        payload: Payload,
    ) -> Result<Value, AppError> {
        let audience = authorize(schema, Operation::Create, actor)?;
        let path_category = path_category(schema, category)?;

        let (body, stored) = self.materialize(schema, payload, &HashSet::new()).await?;
        let result = async {
            let category = match body_category(schema, &body)? {
                Some(c) => Some(merge_categories(path_category.clone(), c)?),
                None => path_category.clone(),
            };
            if schema.is_categorized() && category.is_none() {
                return Err(DomainError::Validation(format!("{}: is required", CATEGORY_KEY)).into());
            }

            let data = validate_create(schema, &body).map_err(DomainError::from)?;
            self.check_unique(schema, &data, None).await?;

            let record = self
                .records
                .create(&NewRecord {
                    resource: schema.name.to_string(),
                    category,
                    data,
                })
                .await?;
            Ok::<Record, AppError>(record)
        }
        .await;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                self.discard(&stored).await;
                return Err(e);
            }
        };

        tracing::info!(
            resource = schema.name,
            record_id = %record.id,
            user_id = ?actor.map(|u| u.id.to_string()),
            "Record created"
        );

        Ok(render(schema, &record, audience))
    }

    pub async fn update(
        &self,
        schema: &ResourceSchema,
        actor: Option<&User>,
        category: Option<&str>,
        id: &RecordId,
        payload: Payload,
    ) -> Result<Value, AppError> {
        let audience = authorize(schema, Operation::Write, actor)?;
        let existing = self.load(schema, category, id).await?;
        let path_category = path_category(schema, category)?;

        let file_fields = schema.file_fields();
        let owned: HashSet<&str> = existing.file_paths(&file_fields).into_iter().collect();
        let (body, stored) = self.materialize(schema, payload, &owned).await?;
        let result = async {
            let category = match body_category(schema, &body)? {
                Some(c) => Some(merge_categories(path_category.clone(), c)?),
                None => existing.category.clone(),
            };

            let data = validate_update(schema, &existing.data, &body).map_err(DomainError::from)?;
            self.check_unique(schema, &data, Some(&existing.id)).await?;

            let record = self
                .records
                .update(&existing.id, &RecordChanges { category, data })
                .await?;
            Ok::<Record, AppError>(record)
        }
        .await;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                self.discard(&stored).await;
                return Err(e);
            }
        };

        let kept: HashSet<&str> = record.file_paths(&file_fields).into_iter().collect();
        let dropped: Vec<String> = existing
            .file_paths(&file_fields)
            .into_iter()
            .filter(|p| !kept.contains(p))
            .map(str::to_string)
            .collect();
        self.discard(&dropped).await;

        tracing::info!(
            resource = schema.name,
            record_id = %record.id,
            user_id = ?actor.map(|u| u.id.to_string()),
            "Record updated"
        );

        Ok(render(schema, &record, audience))
    }

    pub async fn delete(
        &self,
        schema: &ResourceSchema,
        actor: Option<&User>,
        category: Option<&str>,
        id: &RecordId,
    ) -> Result<(), AppError> {
        authorize(schema, Operation::Write, actor)?;
        let existing = self.load(schema, category, id).await?;

        if !self.records.delete(&existing.id).await? {
            return Err(not_found(schema, id));
        }

        let file_fields = schema.file_fields();
        let paths: Vec<String> = existing
            .file_paths(&file_fields)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.discard(&paths).await;

        tracing::info!(
            resource = schema.name,
            record_id = %id,
            user_id = ?actor.map(|u| u.id.to_string()),
            "Record deleted"
        );

        Ok(())
    }

    async fn load(
        &self,
        schema: &ResourceSchema,
        category: Option<&str>,
        id: &RecordId,
    ) -> Result<Record, AppError> {
        let wanted = path_category(schema, category)?;
        let record = self
            .records
            .find_by_id(schema.name, id)
            .await?
            .ok_or_else(|| not_found(schema, id))?;

        match wanted {
            Some(c) if record.category.as_deref() != Some(c.as_str()) => {
                Err(not_found(schema, id))
            }
            _ => Ok(record),
        }
    }

    async fn check_unique(
        &self,
        schema: &ResourceSchema,
        data: &Map<String, Value>,
        exclude: Option<&RecordId>,
    ) -> Result<(), AppError> {
        for spec in schema.unique_fields() {
            let Some(value) = data.get(spec.name).and_then(Value::as_str) else {
                continue;
            };
            if let Some(other) = self
                .records
                .find_by_field(schema.name, spec.name, value)
                .await?
            {
                if Some(&other.id) != exclude {
                    return Err(DomainError::AlreadyExists(format!(
                        "{} with {} '{}' already exists",
                        schema.name, spec.name, value
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Turn a request body into a JSON document, storing any uploaded files.
    ///
    /// `owned` holds the stored uploads the record already references; the
    /// body may not name any other stored upload. Returns the document and
    /// the paths of newly stored files.
    async fn materialize(
        &self,
        schema: &ResourceSchema,
        payload: Payload,
        owned: &HashSet<&str>,
    ) -> Result<(Value, Vec<String>), AppError> {
        let form = match payload {
            Payload::Json(value) => {
                if let Some(object) = value.as_object() {
                    check_file_references(schema, object, owned)?;
                }
                return Ok((value, Vec::new()));
            }
            Payload::Form(form) => form,
        };

        let mut body = Map::new();
        for (name, text) in form.fields {
            match schema.field(&name) {
                Some(spec) if spec.kind == FieldKind::Files => {
                    if let Value::Array(items) = body
                        .entry(name)
                        .or_insert_with(|| Value::Array(Vec::new()))
                    {
                        items.push(Value::String(text));
                    }
                }
                Some(spec) => {
                    body.insert(name, coerce_form_value(&spec.kind, &text));
                }
                // Unknown names go through untouched so validation reports them
                None => {
                    body.insert(name, Value::String(text));
                }
            }
        }
        check_file_references(schema, &body, owned)?;

        for file in &form.files {
            match schema.field(&file.field) {
                Some(spec) if spec.kind == FieldKind::Files => {}
                _ => {
                    return Err(DomainError::Validation(format!(
                        "{}: does not accept file uploads",
                        file.field
                    ))
                    .into())
                }
            }
            self.check_upload(file)?;
        }

        let mut stored = Vec::with_capacity(form.files.len());
        for file in &form.files {
            match self.uploads.store(file).await {
                Ok(path) => {
                    if let Value::Array(items) = body
                        .entry(file.field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()))
                    {
                        items.push(Value::String(path.clone()));
                    }
                    stored.push(path);
                }
                Err(e) => {
                    self.discard(&stored).await;
                    return Err(e.into());
                }
            }
        }

        Ok((Value::Object(body), stored))
    }

    fn check_upload(&self, file: &UploadedFile) -> Result<(), UploadError> {
        if extension_for(&file.content_type).is_none() {
            return Err(UploadError::UnsupportedType(file.content_type.clone()));
        }
        if file.bytes.len() > self.max_upload_bytes {
            return Err(UploadError::TooLarge {
                size: file.bytes.len(),
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Best-effort removal of stored files
    async fn discard(&self, paths: &[String]) {
        for path in paths {
            if !path.starts_with(UPLOAD_PATH_PREFIX) {
                continue;
            }
            if let Err(e) = self.uploads.remove(path).await {
                tracing::warn!(error = %e, path = %path, "Failed to remove stored file");
            }
        }
    }
}

fn authorize(
    schema: &ResourceSchema,
    operation: Operation,
    actor: Option<&User>,
) -> Result<Audience, AppError> {
    match (operation, actor) {
        (Operation::Read, None) if schema.public_read => Ok(Audience::Public),
        (Operation::Create, None) if schema.public_create => Ok(Audience::Public),
        (_, None) => Err(AppError::Unauthorized),
        (Operation::Read, Some(_)) => Ok(Audience::Staff),
        (_, Some(user)) if schema.admin_only_write && !user.is_admin() => Err(AppError::Forbidden),
        (_, Some(_)) => Ok(Audience::Staff),
    }
}

/// Stored uploads may only be referenced by the record that owns them, so
/// removing one record's files never breaks another.
fn check_file_references(
    schema: &ResourceSchema,
    body: &Map<String, Value>,
    owned: &HashSet<&str>,
) -> Result<(), AppError> {
    for field in schema.file_fields() {
        let Some(items) = body.get(field).and_then(Value::as_array) else {
            continue;
        };
        for path in items.iter().filter_map(Value::as_str).map(str::trim) {
            if path.starts_with(UPLOAD_PATH_PREFIX) && !owned.contains(path) {
                return Err(DomainError::Validation(format!(
                    "{}: '{}' is not a file of this record",
                    field, path
                ))
                .into());
            }
        }
    }
    Ok(())
}

/// Category named in the URL, if any
fn path_category(
    schema: &ResourceSchema,
    category: Option<&str>,
) -> Result<Option<String>, AppError> {
    let Some(category) = category else {
        return Ok(None);
    };
    if !schema.is_categorized() {
        return Err(AppError::NotFound(format!(
            "{} has no categories",
            schema.name
        )));
    }
    validate_category(category)
        .map(Some)
        .map_err(|_| AppError::NotFound(format!("No {} category '{}'", schema.name, category)))
}

/// Category named in the request body, if any
fn body_category(schema: &ResourceSchema, body: &Value) -> Result<Option<String>, AppError> {
    let Some(value) = body.get(CATEGORY_KEY) else {
        return Ok(None);
    };
    if !schema.is_categorized() {
        return Err(DomainError::Validation(format!(
            "{}: {} has no categories",
            CATEGORY_KEY, schema.name
        ))
        .into());
    }
    let text = value.as_str().ok_or_else(|| {
        DomainError::Validation(format!("{}: must be a string", CATEGORY_KEY))
    })?;
    validate_category(text)
        .map(Some)
        .map_err(|e| DomainError::from(e).into())
}

fn merge_categories(path: Option<String>, body: String) -> Result<String, AppError> {
    match path {
        Some(p) if p != body => Err(AppError::BadRequest(format!(
            "category in body ('{}') does not match the URL ('{}')",
            body, p
        ))),
        _ => Ok(body),
    }
}

fn not_found(schema: &ResourceSchema, id: &RecordId) -> AppError {
    AppError::NotFound(format!("{} {} not found", schema.name, id))
}

/// Shape a record for the response: selected fields plus metadata
pub fn render(schema: &ResourceSchema, record: &Record, audience: Audience) -> Value {
    let mut object = schema.selection_for(audience).apply(&record.data);
    object.insert("id".to_string(), Value::String(record.id.to_string()));
    if schema.is_categorized() {
        object.insert(
            CATEGORY_KEY.to_string(),
            record
                .category
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
    }
    object.insert(
        "createdAt".to_string(),
        Value::String(record.created_at.to_rfc3339()),
    );
    object.insert(
        "updatedAt".to_string(),
        Value::String(record.updated_at.to_rfc3339()),
    );
    Value::Object(object)
}
