//! Error handling for the API server
//!
//! Handlers return [`ApiResult`]. Every error renders as
//!
//! ```json
//! { "error": "not_found", "message": "Task not found" }
//! ```
//!
//! with an extra `details` list of `{field, message}` for validation errors.
//! Internal errors are logged and replaced by a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskdesk_shared::{
    auth::{credentials::CredentialError, jwt::JwtError, middleware::AuthError, password::PasswordError},
    error::StoreError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Field-level validation failures (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation, as named in the request
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg, None),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::PoolTimedOut => {
                ApiError::ServiceUnavailable("Database is unavailable".to_string())
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => ApiError::NotFound(format!("{} not found", entity)),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::InvalidReference { field, message } => {
                ApiError::invalid_field(field, message)
            }
            StoreError::Database(e) => e.into(),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::UsernameTaken => {
                ApiError::Conflict("Username is already taken".to_string())
            }
            CredentialError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid username or password".to_string())
            }
            CredentialError::Password(e) => e.into(),
            CredentialError::Database(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(e) => e.into(),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::WeakSecret | JwtError::CreateError(_) => {
                ApiError::InternalError(format!("Token signing failed: {}", err))
            }
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Flattens `validator` output into field-level details
///
/// Field names are reported in camelCase, as the client sent them.
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                let field = camel_case(field);
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.clone(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::Conflict("Username is already taken".to_string());
        assert_eq!(err.to_string(), "Conflict: Username is already taken");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::invalid_field("title", "x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized(String::new()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden(String::new()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound(String::new()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict(String::new()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InternalError(String::new()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_map_to_statuses() {
        let err: ApiError = StoreError::NotFound("Category").into();
        assert!(matches!(&err, ApiError::NotFound(msg) if msg == "Category not found"));

        let err: ApiError = StoreError::Conflict("in use".to_string()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = StoreError::InvalidReference {
            field: "categoryId",
            message: "Category does not exist for this user".to_string(),
        }
        .into();
        match err {
            ApiError::ValidationError(details) => assert_eq!(details[0].field, "categoryId"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_credential_errors_map_to_statuses() {
        let taken: ApiError = CredentialError::UsernameTaken.into();
        assert_eq!(taken.status(), StatusCode::CONFLICT);

        let invalid: ApiError = CredentialError::InvalidCredentials.into();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        let err: ApiError = JwtError::InvalidAudience.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: ApiError = AuthError::MissingCredentials.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,

        #[validate(range(min = 1, message = "categoryId must be positive"))]
        category_id: i32,
    }

    #[test]
    fn test_validator_errors_use_camel_case_fields() {
        let sample = Sample {
            title: String::new(),
            category_id: 0,
        };

        match ApiError::from(sample.validate().unwrap_err()) {
            ApiError::ValidationError(details) => {
                assert_eq!(
                    details,
                    vec![
                        ValidationErrorDetail::new("categoryId", "categoryId must be positive"),
                        ValidationErrorDetail::new("title", "Title is required"),
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("is_completed"), "isCompleted");
        assert_eq!(camel_case("title"), "title");
    }
}
