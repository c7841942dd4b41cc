//! # TaskDesk Shared Library
//!
//! This crate contains the data layer and authentication primitives used by
//! the TaskDesk API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their owner-scoped operations
//! - `query`: List filters, sort keys and pagination
//! - `auth`: Password hashing, credential store, tokens, request auth context
//! - `db`: Connection pool and migrations
//! - `error`: Data-layer error type

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod query;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
