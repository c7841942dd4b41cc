//! Task endpoints
//!
//! - `GET    /api/tasks`      list (categoryId, isCompleted, search, page, pageSize, sortBy, sortDir)
//! - `POST   /api/tasks`      create
//! - `GET    /api/tasks/:id`  fetch
//! - `PUT    /api/tasks/:id`  update
//! - `DELETE /api/tasks/:id`  delete
//!
//! Every route is scoped to the caller. A `userId` in a create body that is
//! not the caller is refused with 403 rather than corrected.

use super::{empty_as_none, flag_empty_as_none, location, not_blank, ResourceId};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, UpdateTask},
    query::{
        task::{TaskFilter, TaskListParams, TaskSort, DEFAULT_TASK_PAGE_SIZE},
        PageRequest, Paged,
    },
};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

/// Task as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Option<i32>,
    pub is_completed: bool,
    pub created: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            category_id: task.category_id,
            is_completed: task.is_completed,
            created: task.created,
            updated_at: task.updated_at,
        }
    }
}

/// Body for `POST /api/tasks`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Must be the caller when present
    pub user_id: Option<Uuid>,

    #[validate(
        length(min = 1, max = 160, message = "Title must be 1-160 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(
        length(min = 1, max = 10000, message = "Description must be 1-10000 characters"),
        custom(function = "not_blank")
    )]
    pub description: String,

    #[validate(range(min = 1, message = "categoryId must be a positive integer"))]
    pub category_id: Option<i32>,

    #[serde(default)]
    pub is_completed: bool,
}

/// Body for `PUT /api/tasks/:id`
///
/// Leaving out `categoryId` keeps the current category.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(
        length(min = 1, max = 160, message = "Title must be 1-160 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(
        length(min = 1, max = 10000, message = "Description must be 1-10000 characters"),
        custom(function = "not_blank")
    )]
    pub description: String,

    #[validate(range(min = 1, message = "categoryId must be a positive integer"))]
    pub category_id: Option<i32>,

    pub is_completed: bool,
}

/// List query string
///
/// Keys are accepted in camelCase and PascalCase; empty values mean "no filter".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    #[serde(default, alias = "CategoryId", deserialize_with = "empty_as_none")]
    pub category_id: Option<i32>,

    #[serde(default, alias = "IsCompleted", deserialize_with = "flag_empty_as_none")]
    pub is_completed: Option<bool>,

    #[serde(default, alias = "Search")]
    pub search: Option<String>,

    #[serde(default, alias = "Page", deserialize_with = "empty_as_none")]
    pub page: Option<i64>,

    #[serde(default, alias = "PageSize", deserialize_with = "empty_as_none")]
    pub page_size: Option<i64>,

    #[serde(default, alias = "SortBy")]
    pub sort_by: Option<String>,

    #[serde(default, alias = "SortDir")]
    pub sort_dir: Option<String>,
}

impl From<TaskListQuery> for TaskListParams {
    fn from(query: TaskListQuery) -> Self {
        Self {
            filter: TaskFilter {
                category_id: query.category_id,
                is_completed: query.is_completed,
                search: query.search,
            },
            sort: TaskSort::parse(query.sort_by.as_deref(), query.sort_dir.as_deref()),
            page: PageRequest::new(query.page, query.page_size, DEFAULT_TASK_PAGE_SIZE),
        }
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Paged<TaskResponse>>> {
    let params = TaskListParams::from(query);
    let page = Task::list(&state.db, auth.owner(), &params).await?;

    Ok(Json(page.map(TaskResponse::from)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find(&state.db, auth.owner(), id).await?;
    Ok(Json(task.into()))
}

/// Creates a task for the caller
///
/// # Errors
///
/// - `400 Bad Request`: invalid fields, or `categoryId` not one of the caller's categories
/// - `403 Forbidden`: `userId` names someone other than the caller
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, HeaderMap, Json<TaskResponse>)> {
    if let Some(user_id) = req.user_id {
        if user_id != auth.user_id {
            warn!(user_id = %auth.user_id, claimed = %user_id, "Task create for another user refused");
            return Err(ApiError::Forbidden(
                "Cannot create tasks for another user".to_string(),
            ));
        }
    }

    req.validate()?;

    let task = Task::create(
        &state.db,
        auth.owner(),
        CreateTask {
            title: req.title,
            description: req.description,
            is_completed: req.is_completed,
            category_id: req.category_id,
        },
    )
    .await?;

    let headers = location(format!("/api/tasks/{}", task.id));
    Ok((StatusCode::CREATED, headers, Json(task.into())))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate()?;

    let task = Task::update(
        &state.db,
        auth.owner(),
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            is_completed: req.is_completed,
            category_id: req.category_id,
        },
    )
    .await?;

    Ok(Json(task.into()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId<Uuid>,
) -> ApiResult<StatusCode> {
    Task::delete(&state.db, auth.owner(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
