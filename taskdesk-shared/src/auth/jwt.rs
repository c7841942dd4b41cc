//! Access token issuing and validation
//!
//! Tokens are HS256-signed JWTs. A [`TokenIssuer`] is built once from
//! [`TokenSettings`] at startup and shared by reference; it holds the signing
//! keys and a preconfigured [`Validation`] so nothing is re-derived per request.
//!
//! # Claims
//!
//! | claim         | value                               |
//! |---------------|-------------------------------------|
//! | `sub`         | user id                             |
//! | `uid`         | user id (string form)               |
//! | `name`        | username                            |
//! | `unique_name` | username                            |
//! | `iss` / `aud` | configured issuer / audience        |
//! | `nbf` / `iat` | issue time                          |
//! | `exp`         | issue time + configured lifetime    |
//!
//! Validation checks signature, issuer, audience, `nbf` and `exp` with zero
//! clock-skew leeway.
//!
//! # Example
//!
//! ```
//! use taskdesk_shared::auth::jwt::{TokenIssuer, TokenSettings};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = TokenIssuer::new(&TokenSettings {
//!     secret: "0123456789abcdef0123456789abcdef".to_string(),
//!     issuer: "taskdesk".to_string(),
//!     audience: "taskdesk-client".to_string(),
//!     access_token_minutes: 120,
//! })?;
//!
//! let user_id = Uuid::new_v4();
//! let issued = issuer.issue(user_id, "alice")?;
//! let claims = issuer.validate(&issued.token)?;
//! assert_eq!(claims.user_id()?, user_id);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest accepted HMAC secret, in bytes
pub const MIN_SECRET_BYTES: usize = 32;

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 120;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Signing secret is shorter than [`MIN_SECRET_BYTES`]
    #[error("JWT secret must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,

    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Token was minted for a different audience
    #[error("Invalid token audience")]
    InvalidAudience,

    /// Identity claim is missing or not a user id
    #[error("Token does not identify a user")]
    InvalidSubject,

    /// Signature, format or any other validation failure
    #[error("Failed to validate token: {0}")]
    ValidationError(String),
}

/// Token issuer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// HMAC signing secret (at least 32 bytes)
    pub secret: String,

    /// `iss` claim written and required
    pub issuer: String,

    /// `aud` claim written and required
    pub audience: String,

    /// Access token lifetime in minutes
    pub access_token_minutes: i64,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: String,

    /// User id, preferred over `sub` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Login name
    #[serde(default)]
    pub unique_name: String,

    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// Returns the user the token was issued to
    ///
    /// Reads `uid` and falls back to `sub`.
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        let raw = self
            .uid
            .as_deref()
            .filter(|uid| !uid.is_empty())
            .unwrap_or(&self.sub);

        Uuid::parse_str(raw).map_err(|_| JwtError::InvalidSubject)
    }

    /// Username carried by the token
    pub fn username(&self) -> &str {
        if self.unique_name.is_empty() {
            &self.name
        } else {
            &self.unique_name
        }
    }
}

/// A freshly signed token and the moment it stops being valid
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Builds an issuer from settings
    ///
    /// # Errors
    ///
    /// `JwtError::WeakSecret` if the secret is shorter than 32 bytes.
    pub fn new(settings: &TokenSettings) -> Result<Self, JwtError> {
        if settings.secret.len() < MIN_SECRET_BYTES {
            return Err(JwtError::WeakSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            lifetime: Duration::minutes(settings.access_token_minutes),
        })
    }

    /// Issues an access token for a user
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let expires_at = now + self.lifetime;

        let claims = Claims {
            sub: user_id.to_string(),
            uid: Some(user_id.to_string()),
            name: username.to_string(),
            unique_name: username.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = self.sign(&claims)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at);

        Ok(IssuedToken { token, expires_at })
    }

    /// Validates a token and returns its claims
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
                ErrorKind::InvalidAudience => JwtError::InvalidAudience,
                _ => JwtError::ValidationError(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TokenSettings {
        TokenSettings {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            issuer: "taskdesk".to_string(),
            audience: "taskdesk-client".to_string(),
            access_token_minutes: DEFAULT_ACCESS_TOKEN_MINUTES,
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&settings()).expect("valid settings")
    }

    fn claims_for(issuer: &TokenIssuer, user_id: Uuid) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id.to_string(),
            uid: Some(user_id.to_string()),
            name: "alice".to_string(),
            unique_name: "alice".to_string(),
            iss: issuer.issuer.clone(),
            aud: issuer.audience.clone(),
            iat: now,
            nbf: now,
            exp: now + 600,
        }
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let mut short = settings();
        short.secret = "too-short".to_string();

        assert!(matches!(TokenIssuer::new(&short), Err(JwtError::WeakSecret)));
    }

    #[test]
    fn test_issue_and_validate() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();

        let issued = issuer.issue(user_id, "alice").unwrap();
        let claims = issuer.validate(&issued.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.uid.as_deref(), Some(user_id.to_string().as_str()));
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.username(), "alice");
        assert_eq!(claims.iss, "taskdesk");
        assert_eq!(claims.aud, "taskdesk-client");
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_expiry_uses_configured_lifetime() {
        let issuer = issuer();
        let before = Utc::now();
        let issued = issuer.issue(Uuid::new_v4(), "alice").unwrap();

        let lifetime = issued.expires_at - before;
        assert!(lifetime <= Duration::minutes(120));
        assert!(lifetime > Duration::minutes(119));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issued = issuer().issue(Uuid::new_v4(), "alice").unwrap();

        let mut other = settings();
        other.secret = "another-secret-key-at-least-32-bytes".to_string();
        let other = TokenIssuer::new(&other).unwrap();

        assert!(matches!(
            other.validate(&issued.token),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let issued = issuer().issue(Uuid::new_v4(), "alice").unwrap();

        let mut other = settings();
        other.issuer = "someone-else".to_string();
        let other = TokenIssuer::new(&other).unwrap();

        assert!(matches!(other.validate(&issued.token), Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let issued = issuer().issue(Uuid::new_v4(), "alice").unwrap();

        let mut other = settings();
        other.audience = "another-client".to_string();
        let other = TokenIssuer::new(&other).unwrap();

        assert!(matches!(other.validate(&issued.token), Err(JwtError::InvalidAudience)));
    }

    #[test]
    fn test_expired_token_has_no_leeway() {
        let issuer = issuer();
        let mut claims = claims_for(&issuer, Uuid::new_v4());
        claims.iat -= 600;
        claims.nbf -= 600;
        claims.exp = Utc::now().timestamp() - 2;

        let token = issuer.sign(&claims).unwrap();
        assert!(matches!(issuer.validate(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_not_yet_valid_token_is_rejected() {
        let issuer = issuer();
        let mut claims = claims_for(&issuer, Uuid::new_v4());
        claims.nbf = Utc::now().timestamp() + 60;

        let token = issuer.sign(&claims).unwrap();
        assert!(issuer.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            issuer().validate("not.a.jwt"),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_user_id_falls_back_to_sub() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let mut claims = claims_for(&issuer, user_id);
        claims.uid = None;

        let token = issuer.sign(&claims).unwrap();
        let validated = issuer.validate(&token).unwrap();
        assert_eq!(validated.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_non_uuid_identity_is_rejected() {
        let issuer = issuer();
        let mut claims = claims_for(&issuer, Uuid::new_v4());
        claims.uid = Some("42".to_string());

        assert!(matches!(claims.user_id(), Err(JwtError::InvalidSubject)));
    }
}
