//! # TaskDesk API Server Library
//!
//! REST API for per-user task tracking: registration and login, categories
//! and tasks, with every data route scoped to the authenticated caller.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Layered configuration
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Bearer auth, CORS, error body normalization
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
