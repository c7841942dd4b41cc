//! Task model and owner-scoped operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id           UUID PRIMARY KEY,
//!     user_id      UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     title        VARCHAR(160) NOT NULL,
//!     description  TEXT NOT NULL,
//!     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     category_id  INTEGER,
//!     created      TIMESTAMPTZ NOT NULL,
//!     updated_at   TIMESTAMPTZ NOT NULL,
//!     FOREIGN KEY (user_id, category_id) REFERENCES categories (user_id, id)
//! );
//! ```
//!
//! The composite foreign key means a task's category always belongs to the
//! task's owner. Operations check this up front to report a field-level error,
//! and the constraint catches anything that slips between check and write.
//!
//! # Example
//!
//! ```no_run
//! use taskdesk_shared::models::{task::{CreateTask, Task}, OwnerId};
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let owner = OwnerId::new(user_id);
//! let task = Task::create(&pool, owner, CreateTask {
//!     title: "Write report".to_string(),
//!     description: "Quarterly numbers".to_string(),
//!     is_completed: false,
//!     category_id: Some(1),
//! }).await?;
//!
//! Task::delete(&pool, owner, task.id).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{is_foreign_key_violation, violated_constraint, StoreError, StoreResult};
use crate::models::{category::Category, OwnerId};
use crate::query::task::{count_tasks, select_tasks, TaskListParams, TASK_COLUMNS};
use crate::query::Paged;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

const CATEGORY_FOREIGN_KEY: &str = "tasks_category_fkey";

/// Task owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Globally unique task ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Short title (1-160 chars)
    pub title: String,

    /// Body text (required)
    pub description: String,

    /// Completion flag
    pub is_completed: bool,

    /// Category in the owner's namespace
    pub category_id: Option<i32>,

    /// When the task was created
    pub created: DateTime<Utc>,

    /// Strictly increases on every successful update
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub category_id: Option<i32>,
}

/// Input for updating a task
///
/// `category_id: None` leaves the current category unchanged.
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub category_id: Option<i32>,
}

fn invalid_category() -> StoreError {
    StoreError::InvalidReference {
        field: "categoryId",
        message: "Category does not exist for this user".to_string(),
    }
}

/// Maps a write error, turning a composite-key violation into a field error
fn map_write_error(err: sqlx::Error) -> StoreError {
    if is_foreign_key_violation(&err) && violated_constraint(&err) == Some(CATEGORY_FOREIGN_KEY) {
        return invalid_category();
    }
    err.into()
}

async fn ensure_category(pool: &PgPool, owner: OwnerId, category_id: i32) -> StoreResult<()> {
    if Category::exists(pool, owner, category_id).await? {
        Ok(())
    } else {
        debug!(user_id = %owner, category_id, "Rejected category reference");
        Err(invalid_category())
    }
}

impl Task {
    /// Creates a task for the owner
    ///
    /// Both timestamps are set to the same instant.
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidReference` on `categoryId` if the category does not
    /// exist for this owner. No row is inserted.
    pub async fn create(pool: &PgPool, owner: OwnerId, data: CreateTask) -> StoreResult<Self> {
        if let Some(category_id) = data.category_id {
            ensure_category(pool, owner, category_id).await?;
        }

        let now = Utc::now();
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, user_id, title, description, is_completed, category_id, created, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner.as_uuid())
        .bind(data.title)
        .bind(data.description)
        .bind(data.is_completed)
        .bind(data.category_id)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(map_write_error)?;

        debug!(user_id = %owner, task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Fetches one of the owner's tasks
    ///
    /// Another user's task is reported as not found.
    pub async fn find(pool: &PgPool, owner: OwnerId, id: Uuid) -> StoreResult<Self> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner.as_uuid())
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("Task"))
    }

    /// Replaces title, description and completion flag of one of the owner's tasks
    ///
    /// `updated_at` moves strictly forward; `created` is untouched.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if (id, owner) matches nothing
    /// - `StoreError::InvalidReference` if a new category is not the owner's
    pub async fn update(
        pool: &PgPool,
        owner: OwnerId,
        id: Uuid,
        data: UpdateTask,
    ) -> StoreResult<Self> {
        if let Some(category_id) = data.category_id {
            // A missing task wins over a bad category.
            Self::find(pool, owner, id).await?;
            ensure_category(pool, owner, category_id).await?;
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $3,
                description = $4,
                is_completed = $5,
                category_id = COALESCE($6, category_id),
                updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner.as_uuid())
        .bind(data.title)
        .bind(data.description)
        .bind(data.is_completed)
        .bind(data.category_id)
        .fetch_optional(pool)
        .await
        .map_err(map_write_error)?
        .ok_or(StoreError::NotFound("Task"))?;

        debug!(user_id = %owner, task_id = %task.id, "Task updated");
        Ok(task)
    }

    /// Deletes one of the owner's tasks
    pub async fn delete(pool: &PgPool, owner: OwnerId, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner.as_uuid())
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Task"));
        }

        debug!(user_id = %owner, task_id = %id, "Task deleted");
        Ok(())
    }

    /// Lists the owner's tasks with filters, sort and paging
    pub async fn list(
        pool: &PgPool,
        owner: OwnerId,
        params: &TaskListParams,
    ) -> StoreResult<Paged<Self>> {
        let (total,): (i64,) = count_tasks(owner, &params.filter)
            .build_query_as()
            .fetch_one(pool)
            .await?;

        let items = select_tasks(owner, params)
            .build_query_as::<Task>()
            .fetch_all(pool)
            .await?;

        Ok(Paged::new(items, params.page, total))
    }
}
