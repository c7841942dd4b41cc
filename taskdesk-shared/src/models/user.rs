//! User model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id            UUID PRIMARY KEY,
//!     username      VARCHAR(64) NOT NULL UNIQUE,
//!     password_hash VARCHAR(255) NOT NULL,
//!     created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Users are immutable once created. Deleting a user cascades to their
//! categories and tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique login name
    pub username: String,

    /// Argon2id password hash. Never plaintext.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

impl User {
    /// Inserts a new user with a server-generated id
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_username_key` if the username is
    /// already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.username)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by exact username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a user and, by cascade, all their categories and tasks
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("password_hash").is_none());
    }
}
