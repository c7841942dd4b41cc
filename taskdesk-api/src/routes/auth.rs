//! Authentication endpoints
//!
//! - `POST /auth/register`: create an account and get a token
//! - `POST /auth/login`: exchange username and password for a token
//!
//! Both answer with the same body:
//!
//! ```json
//! {
//!   "userId": "uuid",
//!   "username": "alice",
//!   "accessToken": "eyJ...",
//!   "expiresAt": "2025-08-17T12:00:00Z"
//! }
//! ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdesk_shared::models::user::User;
use uuid::Uuid;
use validator::Validate;

/// Credentials for a new account
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// Credentials for an existing account
///
/// Only emptiness is checked here. Length rules belong to registration; any
/// other mismatch is a failed login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Issued token plus the identity it belongs to
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

fn token_response(state: &AppState, user: &User) -> ApiResult<Json<AuthResponse>> {
    let issued = state.tokens.issue(user.id, &user.username)?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        username: user.username.clone(),
        access_token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// Registers a new user
///
/// # Errors
///
/// - `400 Bad Request`: username or password out of range
/// - `409 Conflict`: username already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = state
        .credentials
        .register(&req.username, &req.password)
        .await?;

    token_response(&state, &user)
}

/// Logs a user in
///
/// # Errors
///
/// - `400 Bad Request`: username or password missing
/// - `401 Unauthorized`: unknown username or wrong password, indistinguishably
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = state.credentials.verify(&req.username, &req.password).await?;

    token_response(&state, &user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_login_only_rejects_empty_fields() {
        assert!(login_request("ab", "short1").validate().is_ok());
        assert!(login_request("alice", &"x".repeat(200)).validate().is_ok());
        assert!(login_request("", "password123").validate().is_err());
        assert!(login_request("alice", "").validate().is_err());
    }

    #[test]
    fn test_registration_applies_length_rules() {
        let short = CredentialsRequest {
            username: "ab".to_string(),
            password: "short1".to_string(),
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
