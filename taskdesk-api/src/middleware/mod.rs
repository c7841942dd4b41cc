//! Middleware for the API server
//!
//! - `auth`: bearer token check for `/api` routes
//! - `cors`: CORS policy built from configuration
//! - `errors`: JSON bodies for framework-generated error responses

pub mod auth;
pub mod cors;
pub mod errors;
