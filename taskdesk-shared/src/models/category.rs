//! Category model and owner-scoped operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE categories (
//!     user_id     UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     id          INTEGER NOT NULL,
//!     description VARCHAR(200),
//!     PRIMARY KEY (user_id, id)
//! );
//! ```
//!
//! Category ids are only unique within one user's namespace: two users can
//! both own a category `1`. New ids are `max(existing ids for owner) + 1`.
//!
//! # Id allocation under concurrency
//!
//! The next id is computed inside the `INSERT` itself. Two concurrent creates
//! for the same owner can still compute the same value; the loser hits the
//! primary key and the insert is retried with a fresh `MAX(id)` after a short
//! pause. Every round lets at least one contender through, so the attempt
//! bound only matters for one owner firing more creates at once than that.
//! Past it the create fails with `StoreError::Conflict` (409).

use crate::error::{is_foreign_key_violation, is_unique_violation, StoreError, StoreResult};
use crate::models::OwnerId;
use crate::query::category::{count_categories, select_categories, CategoryListParams};
use crate::query::Paged;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Attempts at allocating a per-owner id before giving up
const MAX_ID_ATTEMPTS: u32 = 32;

/// Pause before retry `attempt`, growing linearly and capped
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(u64::from(attempt.min(10)) * 2)
}

/// Category owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Owning user
    pub user_id: Uuid,

    /// Sequential id within the owner's namespace (starts at 1)
    pub id: i32,

    /// Optional free text
    pub description: Option<String>,
}

impl Category {
    /// Creates a category with the owner's next sequential id
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if every allocation attempt collided with a
    /// concurrent create by the same owner. Only heavy contention gets here;
    /// the request can simply be repeated.
    pub async fn create(
        pool: &PgPool,
        owner: OwnerId,
        description: Option<String>,
    ) -> StoreResult<Self> {
        let mut attempt = 1;

        loop {
            let result = sqlx::query_as::<_, Category>(
                r#"
                INSERT INTO categories (user_id, id, description)
                SELECT $1, COALESCE(MAX(id), 0) + 1, $2
                FROM categories
                WHERE user_id = $1
                RETURNING user_id, id, description
                "#,
            )
            .bind(owner.as_uuid())
            .bind(description.clone())
            .fetch_one(pool)
            .await;

            match result {
                Ok(category) => {
                    debug!(user_id = %owner, category_id = category.id, "Category created");
                    return Ok(category);
                }
                Err(e) if is_unique_violation(&e) && attempt < MAX_ID_ATTEMPTS => {
                    debug!(user_id = %owner, attempt, "Category id collision, retrying");
                    tokio::time::sleep(retry_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!(user_id = %owner, attempts = attempt, "Could not allocate category id");
                    return Err(StoreError::Conflict(
                        "Could not allocate a category id, please retry".to_string(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetches one of the owner's categories
    ///
    /// Another user's category with the same id is reported as not found.
    pub async fn find(pool: &PgPool, owner: OwnerId, id: i32) -> StoreResult<Self> {
        sqlx::query_as::<_, Category>(
            "SELECT user_id, id, description FROM categories WHERE user_id = $1 AND id = $2",
        )
        .bind(owner.as_uuid())
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("Category"))
    }

    /// Checks whether (owner, id) names an existing category
    pub async fn exists(pool: &PgPool, owner: OwnerId, id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE user_id = $1 AND id = $2)",
        )
        .bind(owner.as_uuid())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Replaces the description of one of the owner's categories
    pub async fn update(
        pool: &PgPool,
        owner: OwnerId,
        id: i32,
        description: Option<String>,
    ) -> StoreResult<Self> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET description = $3
            WHERE user_id = $1 AND id = $2
            RETURNING user_id, id, description
            "#,
        )
        .bind(owner.as_uuid())
        .bind(id)
        .bind(description)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("Category"))
    }

    /// Deletes one of the owner's categories
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if (owner, id) matches nothing
    /// - `StoreError::Conflict` if any task still references the category;
    ///   nothing is deleted in that case
    pub async fn delete(pool: &PgPool, owner: OwnerId, id: i32) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE user_id = $1 AND id = $2")
            .bind(owner.as_uuid())
            .bind(id)
            .execute(pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::NotFound("Category")),
            Ok(_) => Ok(()),
            Err(e) if is_foreign_key_violation(&e) => Err(StoreError::Conflict(
                "Category cannot be deleted while tasks reference it".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists the owner's categories with search, sort and paging
    pub async fn list(
        pool: &PgPool,
        owner: OwnerId,
        params: &CategoryListParams,
    ) -> StoreResult<Paged<Self>> {
        let (total,): (i64,) = count_categories(owner, &params.filter)
            .build_query_as()
            .fetch_one(pool)
            .await?;

        let items = select_categories(owner, params)
            .build_query_as::<Category>()
            .fetch_all(pool)
            .await?;

        Ok(Paged::new(items, params.page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_grows_and_is_capped() {
        assert!(retry_delay(2) > retry_delay(1));
        assert_eq!(retry_delay(10), retry_delay(MAX_ID_ATTEMPTS));
        assert!(retry_delay(MAX_ID_ATTEMPTS) <= Duration::from_millis(20));
    }
}
