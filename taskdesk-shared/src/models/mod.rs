//! Database models for TaskDesk
//!
//! - `user`: Accounts and password hashes
//! - `category`: Per-user categories keyed by (owner, sequential id)
//! - `task`: Per-user tasks with an optional same-owner category
//!
//! Every category and task operation takes an [`OwnerId`] as its first data
//! argument. There is no way to read or write those tables without one.

pub mod category;
pub mod task;
pub mod user;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of the user whose rows an operation may touch
///
/// Obtained from the authenticated request context; never from a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Wraps an already-authenticated user id
    pub fn new(user_id: Uuid) -> Self {
        Self(user_id)
    }

    /// Returns the underlying user id
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
