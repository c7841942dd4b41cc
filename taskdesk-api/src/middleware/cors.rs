//! CORS policy
//!
//! `*` in the configured origins allows any origin (without credentials).
//! Otherwise only the listed origins may call the API; entries that are not
//! valid header values are skipped with a warning.

use crate::config::ApiConfig;
use axum::http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Builds the CORS layer for the configured origins
pub fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.iter().any(|origin| origin.trim() == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(ALLOWED_METHODS)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers([header::LOCATION]);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::LOCATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
