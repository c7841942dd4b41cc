//! Category endpoints
//!
//! All routes act on the caller's own categories. A category id that belongs
//! to someone else answers exactly like one that does not exist.
//!
//! - `GET    /api/categories`      list (search, page, pageSize, sortBy, sortDir)
//! - `POST   /api/categories`      create, id assigned per user
//! - `GET    /api/categories/:id`  fetch
//! - `PUT    /api/categories/:id`  replace description
//! - `DELETE /api/categories/:id`  delete; 409 while tasks reference it

use super::{empty_as_none, location, ResourceId};
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::middleware::AuthContext,
    models::category::Category,
    query::{
        category::{CategoryFilter, CategoryListParams, CategorySort, DEFAULT_CATEGORY_PAGE_SIZE},
        PageRequest, Paged,
    },
};
use validator::Validate;

/// Category as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i32,
    pub description: Option<String>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            description: category.description,
        }
    }
}

/// Body for create and update
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

/// List query string
///
/// Keys are accepted in camelCase and PascalCase.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListQuery {
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

impl From<CategoryListQuery> for CategoryListParams {
    fn from(query: CategoryListQuery) -> Self {
        Self {
            filter: CategoryFilter {
                search: query.search,
            },
            sort: CategorySort::parse(query.sort_by.as_deref(), query.sort_dir.as_deref()),
            page: PageRequest::new(query.page, query.page_size, DEFAULT_CATEGORY_PAGE_SIZE),
        }
    }
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CategoryListQuery>,
) -> ApiResult<Json<Paged<CategoryResponse>>> {
    let params = CategoryListParams::from(query);
    let page = Category::list(&state.db, auth.owner(), &params).await?;

    Ok(Json(page.map(CategoryResponse::from)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId<i32>,
) -> ApiResult<Json<CategoryResponse>> {
    let category = Category::find(&state.db, auth.owner(), id).await?;
    Ok(Json(category.into()))
}

/// Creates a category with the caller's next sequential id
///
/// Answers `201 Created` with a `Location` header.
pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CategoryRequest>,
) -> ApiResult<(StatusCode, HeaderMap, Json<CategoryResponse>)> {
    req.validate()?;

    let category = Category::create(&state.db, auth.owner(), req.description).await?;
    let headers = location(format!("/api/categories/{}", category.id));

    Ok((StatusCode::CREATED, headers, Json(category.into())))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId<i32>,
    Json(req): Json<CategoryRequest>,
) -> ApiResult<Json<CategoryResponse>> {
    req.validate()?;

    let category = Category::update(&state.db, auth.owner(), id, req.description).await?;
    Ok(Json(category.into()))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId<i32>,
) -> ApiResult<StatusCode> {
    Category::delete(&state.db, auth.owner(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
