//! Bearer authentication for Axum
//!
//! [`authenticate`] turns an `Authorization: Bearer <token>` header into an
//! [`AuthContext`]. The API's auth layer inserts that context into request
//! extensions, and handlers read it with `Extension<AuthContext>`.
//!
//! ```
//! use axum::Extension;
//! use taskdesk_shared::auth::middleware::AuthContext;
//!
//! async fn handler(Extension(auth): Extension<AuthContext>) -> String {
//!     format!("Hello, {}!", auth.username)
//! }
//! ```

use super::jwt::{JwtError, TokenIssuer};
use crate::models::OwnerId;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Identity of the caller, established from a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user id
    pub user_id: Uuid,

    /// Username from the token
    pub username: String,
}

impl AuthContext {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    /// Owner scope for data operations
    pub fn owner(&self) -> OwnerId {
        OwnerId::new(self.user_id)
    }
}

/// Authentication failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),
}

/// Extracts the raw token from an `Authorization: Bearer` header
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidFormat)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Validates the request's bearer token and builds the caller's context
pub fn authenticate(issuer: &TokenIssuer, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = issuer.validate(token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AuthError::InvalidToken(e)
    })?;

    let user_id = claims.user_id()?;
    Ok(AuthContext::new(user_id, claims.username()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenSettings;
    use axum::http::HeaderValue;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&TokenSettings {
            secret: "middleware-test-secret-0123456789abcdef".to_string(),
            issuer: "taskdesk".to_string(),
            audience: "taskdesk-client".to_string(),
            access_token_minutes: 5,
        })
        .unwrap()
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_auth_context_owner() {
        let user_id = Uuid::new_v4();
        let context = AuthContext::new(user_id, "alice");
        assert_eq!(context.owner().as_uuid(), user_id);
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), "abc");
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat)
        ));
        assert!(matches!(bearer_token(&headers("Bearer")), Err(AuthError::InvalidFormat)));
    }

    #[test]
    fn test_authenticate_valid_token() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let issued = issuer.issue(user_id, "alice").unwrap();

        let context = authenticate(&issuer, &headers(&format!("Bearer {}", issued.token))).unwrap();
        assert_eq!(context, AuthContext::new(user_id, "alice"));
    }

    #[test]
    fn test_authenticate_rejects_tampered_token() {
        let issuer = issuer();
        let issued = issuer.issue(Uuid::new_v4(), "alice").unwrap();
        let tampered = format!("Bearer {}x", issued.token);

        assert!(matches!(
            authenticate(&issuer, &headers(&tampered)),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_authenticate_requires_header() {
        assert!(matches!(
            authenticate(&issuer(), &HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
    }
}
