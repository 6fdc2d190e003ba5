//! Authentication handlers
//!
//! Login, token refresh and the caller's own account.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::app::{Session, TokenPair};
use crate::domain::entities::User;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Token pair plus the signed-in user
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        SessionResponse {
            tokens: session.tokens,
            user: session.user,
        }
    }
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(req) = body?;
    let session = state.auth_service.login(&req.email, &req.password).await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(req) = body?;
    let session = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(Json(session.into()))
}

/// GET /api/v1/auth/me
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// PUT /api/v1/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body?;
    state
        .auth_service
        .change_password(&user, &req.current_password, &req.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
