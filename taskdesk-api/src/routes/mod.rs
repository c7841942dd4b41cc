//! API route handlers
//!
//! - `health`: health check endpoint
//! - `auth`: registration and login
//! - `categories`: per-user categories
//! - `tasks`: per-user tasks

pub mod auth;
pub mod categories;
pub mod health;
pub mod tasks;

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{rejection::PathRejection, FromRequestParts, Path},
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer};
use std::{fmt, str::FromStr};
use tracing::debug;
use validator::ValidationError;

/// Resource id from the `:id` path segment
///
/// An id that does not parse cannot name an existing resource, so it is
/// answered with 404 like any other missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ResourceId<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                debug!(error = %e, "Unparseable resource id");
                Err(ApiError::NotFound("Resource not found".to_string()))
            }
            Err(e) => Err(ApiError::InternalError(format!("Path extraction failed: {}", e))),
        }
    }
}

/// Deserializes an optional query value, treating `?key=` like a missing key
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Like [`empty_as_none`] for booleans, accepting `true`/`false` in any case
pub(crate) fn flag_empty_as_none<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(value) => Err(de::Error::custom(format!("invalid boolean `{value}`"))),
    }
}

/// Rejects strings that are empty after trimming
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// `Location` header for a newly created resource
pub(crate) fn location(path: String) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&path) {
        headers.insert(header::LOCATION, value);
    }
    headers
}
