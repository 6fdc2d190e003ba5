//! Auth service
//!
//! Handles console login, token refresh and validation, password changes and
//! user management.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;

use super::password::{
    check_password_strength, credential_fingerprint, hash_password, verify_password,
};
use super::tokens::{create_authentication_token, validate_token, Claims, TokenKeys, TokenKind};
use crate::domain::entities::{NewUser, Role, User, UserChanges, UserId};
use crate::domain::ports::UserRepository;
use crate::domain::schema::validation::is_valid_email;
use crate::error::{AppError, DomainError};

/// Access and refresh tokens issued together
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Result of a successful login or refresh
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub tokens: TokenPair,
}

/// Data for creating a console user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    keys: TokenKeys,
    crypto_key: String,
    bcrypt_cost: u32,
    /// Checked when a login names an unknown email, so that case costs a
    /// bcrypt round like a wrong password does
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        keys: TokenKeys,
        crypto_key: String,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            keys,
            crypto_key,
            bcrypt_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Exchange email and password for a token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);
        let invalid = || DomainError::Unauthorized("invalid credentials".to_string());

        let Some(user) = self.users.find_by_email(&email).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| hash_password("unknown-account", self.bcrypt_cost))
                .await?;
            verify_password(password, dummy).await?;
            return Err(invalid().into());
        };

        if !verify_password(password, &user.password_hash).await? {
            tracing::info!(user_id = %user.id, "Rejected login with wrong password");
            return Err(invalid().into());
        }

        if !user.is_active {
            return Err(DomainError::Forbidden("account is disabled".to_string()).into());
        }

        if let Err(e) = self.users.touch_login(&user.id).await {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to record login time");
        }

        let tokens = self.issue_tokens(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Session { user, tokens })
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AppError> {
        let claims = validate_token(&self.keys, refresh_token, TokenKind::Refresh)
            .map_err(DomainError::from)?;
        let user = self.load_session_user(&claims).await?;
        let tokens = self.issue_tokens(&user)?;

        Ok(Session { user, tokens })
    }

    /// Resolve an access token to its user
    pub async fn validate_token(&self, access_token: &str) -> Result<User, AppError> {
        let claims = validate_token(&self.keys, access_token, TokenKind::Access)
            .map_err(DomainError::from)?;
        self.load_session_user(&claims).await
    }

    async fn load_session_user(&self, claims: &Claims) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_id(&UserId(claims.sub))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if credential_fingerprint(&self.crypto_key, &user.password_hash)? != claims.fp {
            return Err(DomainError::Unauthorized("token has been revoked".to_string()).into());
        }

        if !user.is_active {
            return Err(DomainError::Forbidden("account is disabled".to_string()).into());
        }

        Ok(user)
    }

    fn issue_tokens(&self, user: &User) -> Result<TokenPair, AppError> {
        let fingerprint = credential_fingerprint(&self.crypto_key, &user.password_hash)?;

        Ok(TokenPair {
            access_token: create_authentication_token(
                &self.keys,
                user,
                TokenKind::Access,
                &fingerprint,
            )?,
            refresh_token: create_authentication_token(
                &self.keys,
                user,
                TokenKind::Refresh,
                &fingerprint,
            )?,
            token_type: "Bearer",
            expires_in: self.keys.ttl_secs(TokenKind::Access),
        })
    }

    /// Change the caller's own password. Outstanding tokens stop working.
    pub async fn change_password(
        &self,
        user: &User,
        current: &str,
        new: &str,
    ) -> Result<(), AppError> {
        if !verify_password(current, &user.password_hash).await? {
            return Err(DomainError::Unauthorized("current password is wrong".to_string()).into());
        }
        check_password_strength(new)?;

        let hash = hash_password(new, self.bcrypt_cost).await?;
        self.users.update_password(&user.id, &hash).await?;
        tracing::info!(user_id = %user.id, "Password changed");

        Ok(())
    }

    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>, AppError> {
        require_admin(actor)?;
        Ok(self.users.list().await?)
    }

    pub async fn create_user(&self, actor: &User, request: CreateUser) -> Result<User, AppError> {
        require_admin(actor)?;

        let name = validate_name(&request.name)?;
        let email = normalize_email(&request.email);
        if !is_valid_email(&email) {
            return Err(
                DomainError::Validation("email: must be a valid email address".to_string()).into(),
            );
        }
        check_password_strength(&request.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                email
            ))
            .into());
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost).await?;
        let user = self
            .users
            .create(&NewUser {
                name,
                email,
                password_hash,
                role: request.role,
            })
            .await?;

        tracing::info!(user_id = %user.id, created_by = %actor.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update_user(
        &self,
        actor: &User,
        id: &UserId,
        mut changes: UserChanges,
    ) -> Result<User, AppError> {
        require_admin(actor)?;

        let target = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        if let Some(name) = changes.name.as_deref() {
            changes.name = Some(validate_name(name)?);
        }

        let loses_admin =
            changes.role == Some(Role::Editor) || changes.is_active == Some(false);
        if loses_admin && target.id == actor.id {
            return Err(DomainError::Conflict(
                "you cannot demote or deactivate your own account".to_string(),
            )
            .into());
        }
        if loses_admin && target.is_admin() && target.is_active {
            self.ensure_other_admin_remains().await?;
        }

        Ok(self.users.update(id, &changes).await?)
    }

    pub async fn delete_user(&self, actor: &User, id: &UserId) -> Result<(), AppError> {
        require_admin(actor)?;

        if *id == actor.id {
            return Err(
                DomainError::Conflict("you cannot delete your own account".to_string()).into(),
            );
        }

        let target = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        if target.is_admin() && target.is_active {
            self.ensure_other_admin_remains().await?;
        }

        if !self.users.delete(id).await? {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        tracing::info!(user_id = %id, deleted_by = %actor.id, "User deleted");

        Ok(())
    }

    async fn ensure_other_admin_remains(&self) -> Result<(), AppError> {
        if self.users.count_active_by_role(Role::Admin).await? <= 1 {
            return Err(DomainError::Conflict(
                "at least one active admin must remain".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

fn require_admin(actor: &User) -> Result<(), AppError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub(crate) fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > User::NAME_MAX {
        return Err(DomainError::Validation(format!(
            "name: must be between 1 and {} characters",
            User::NAME_MAX
        )));
    }
    Ok(name.to_string())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
