//! JSON bodies for framework-generated errors
//!
//! Extractor rejections (bad JSON, bad query values, unknown routes)
//! come out of axum as `text/plain`. This layer replaces them with the same
//! `{error, message}` shape [`crate::error::ApiError`] produces. Body
//! deserialization failures, which axum reports as 422, become 400 so every
//! malformed request gets the same status.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub async fn normalize_error_response(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if is_json {
        return response;
    }

    generic_error_response(status)
}

fn generic_error_response(status: StatusCode) -> Response {
    let (status, error, message) = match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => (
            StatusCode::BAD_REQUEST,
            "bad_request",
            "Malformed request",
        ),
        StatusCode::UNAUTHORIZED => (status, "unauthorized", "Authentication required"),
        StatusCode::FORBIDDEN => (status, "forbidden", "Access denied"),
        StatusCode::NOT_FOUND => (status, "not_found", "Not found"),
        StatusCode::METHOD_NOT_ALLOWED => (status, "method_not_allowed", "Method not allowed"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => (
            status,
            "unsupported_media_type",
            "Expected an application/json body",
        ),
        _ if status.is_client_error() => (status, "client_error", "Client error"),
        _ => (status, "internal_error", "An internal error occurred"),
    };

    (status, Json(json!({ "error": error, "message": message }))).into_response()
}
