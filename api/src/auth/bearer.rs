//! Bearer token authentication middleware

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::AppState;

/// Extract the bearer token from the Authorization header
fn extract_bearer(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// Validates the access token and injects the User into request extensions.
/// Routes that require authentication should use this middleware.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(&request).ok_or(AppError::Unauthorized)?;
    let user = state.auth_service.validate_token(token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Anonymous requests pass through with no User in extensions. A token that
/// is present must still be valid: a bad token is rejected rather than
/// silently downgraded to anonymous access.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = extract_bearer(&request) {
        let user = state.auth_service.validate_token(token).await?;
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}
