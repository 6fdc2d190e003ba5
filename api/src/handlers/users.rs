//! User management handlers
//!
//! Admin-only management of console accounts.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::CreateUser;
use crate::domain::entities::{Role, User, UserChanges, UserId};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Editor
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state.auth_service.list_users(&actor).await?;
    Ok(Json(users))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(req) = body?;
    let user = state
        .auth_service
        .create_user(
            &actor,
            CreateUser {
                name: req.name,
                email: req.email,
                password: req.password,
                role: req.role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/v1/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(req) = body?;
    let user = state
        .auth_service
        .update_user(
            &actor,
            &UserId(id),
            UserChanges {
                name: req.name,
                role: req.role,
                is_active: req.is_active,
            },
        )
        .await?;

    Ok(Json(user))
}

/// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.auth_service.delete_user(&actor, &UserId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
