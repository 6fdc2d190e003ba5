//! Health and schema metadata

use axum::{extract::Path, Json};
use serde::Serialize;

use crate::domain::schema::{self, ResourceSchema};
use crate::error::AppError;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/v1/meta/resources
///
/// Every resource schema, for building the admin console's forms.
pub async fn list_resources() -> Json<&'static [ResourceSchema]> {
    Json(schema::all())
}

/// GET /api/v1/meta/resources/:resource
pub async fn get_resource(
    Path(resource): Path<String>,
) -> Result<Json<&'static ResourceSchema>, AppError> {
    schema::find(&resource)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Unknown resource '{}'", resource)))
}
