//! Database layer for TaskDesk
//!
//! - `pool`: PostgreSQL connection pool with health check
//! - `migrations`: Embedded schema migrations
//!
//! Models live in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
