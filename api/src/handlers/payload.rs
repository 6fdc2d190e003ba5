//! Create/update request bodies
//!
//! Resource writes accept either a JSON object or a multipart form. Anything
//! else is rejected with 415.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde_json::Value;

use crate::app::{FormData, Payload};
use crate::domain::ports::UploadedFile;
use crate::error::AppError;

fn content_type(req: &Request) -> String {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

async fn read_form(mut multipart: Multipart) -> Result<FormData, AppError> {
    let bad = |e: axum::extract::multipart::MultipartError| {
        AppError::BadRequest(format!("malformed multipart body: {}", e))
    };

    let mut form = FormData::default();
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        if name.is_empty() {
            continue;
        }

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad)?;
                // Browsers send an empty part for a file input left blank
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.push(UploadedFile {
                    field: name,
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let text = field.text().await.map_err(bad)?;
                form.fields.push((name, text));
            }
        }
    }

    Ok(form)
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = content_type(&req);

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state).await?;
            Ok(Payload::Json(value))
        } else if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Payload::Form(read_form(multipart).await?))
        } else {
            Err(AppError::UnsupportedMediaType(if content_type.is_empty() {
                "missing Content-Type".to_string()
            } else {
                content_type
            }))
        }
    }
}
