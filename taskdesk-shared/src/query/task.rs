//! Task list filters and sort keys

use super::{search_pattern, PageRequest, SortDirection};
use crate::models::OwnerId;
use sqlx::{Postgres, QueryBuilder};

/// Page size used when the client does not send one
pub const DEFAULT_TASK_PAGE_SIZE: i64 = 20;

pub(crate) const TASK_COLUMNS: &str =
    "id, user_id, title, description, is_completed, category_id, created, updated_at";

/// Sortable task columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    Title,
    Created,
    UpdatedAt,
}

impl TaskSortField {
    /// Case-insensitive match against `title`, `created`, `updatedAt`
    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Some(TaskSortField::Title),
            "created" => Some(TaskSortField::Created),
            "updatedat" => Some(TaskSortField::UpdatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            TaskSortField::Title => "title",
            TaskSortField::Created => "created",
            TaskSortField::UpdatedAt => "updated_at",
        }
    }
}

/// Task ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

impl Default for TaskSort {
    /// Most recently updated first
    fn default() -> Self {
        Self {
            field: TaskSortField::UpdatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl TaskSort {
    /// Parses raw query parameters
    ///
    /// A recognized field sorts ascending only for `asc`; any other direction
    /// sorts descending. An unrecognized field yields the default order.
    pub fn parse(sort_by: Option<&str>, sort_dir: Option<&str>) -> Self {
        let field = match sort_by {
            None => TaskSortField::UpdatedAt,
            Some(raw) => match TaskSortField::from_param(raw) {
                Some(field) => field,
                None => return Self::default(),
            },
        };

        let direction = match sort_dir.and_then(SortDirection::from_param) {
            Some(SortDirection::Asc) => SortDirection::Asc,
            _ => SortDirection::Desc,
        };

        Self { field, direction }
    }
}

/// Task list filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Exact category match
    pub category_id: Option<i32>,

    /// Exact completion-flag match
    pub is_completed: Option<bool>,

    /// Case-insensitive substring over title and description
    pub search: Option<String>,
}

/// Everything a task list request carries besides the owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListParams {
    pub filter: TaskFilter,
    pub sort: TaskSort,
    pub page: PageRequest,
}

impl Default for TaskListParams {
    fn default() -> Self {
        Self {
            filter: TaskFilter::default(),
            sort: TaskSort::default(),
            page: PageRequest::new(None, None, DEFAULT_TASK_PAGE_SIZE),
        }
    }
}

/// Builds the paged, ordered `SELECT` for an owner's tasks
pub fn select_tasks(owner: OwnerId, params: &TaskListParams) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
    push_conditions(&mut qb, owner, &params.filter);

    qb.push(" ORDER BY ")
        .push(params.sort.field.column())
        .push(" ")
        .push(params.sort.direction.as_sql())
        .push(", id ASC");

    qb.push(" LIMIT ")
        .push_bind(params.page.limit())
        .push(" OFFSET ")
        .push_bind(params.page.offset());

    qb
}

/// Builds the `COUNT(*)` over the same filters, without paging
pub fn count_tasks(owner: OwnerId, filter: &TaskFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
    push_conditions(&mut qb, owner, filter);
    qb
}

fn push_conditions(qb: &mut QueryBuilder<'static, Postgres>, owner: OwnerId, filter: &TaskFilter) {
    qb.push(" WHERE user_id = ").push_bind(owner.as_uuid());

    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }

    if let Some(is_completed) = filter.is_completed {
        qb.push(" AND is_completed = ").push_bind(is_completed);
    }

    if let Some(pattern) = search_pattern(filter.search.as_deref()) {
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR description ILIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn owner() -> OwnerId {
        OwnerId::new(Uuid::new_v4())
    }

    #[test]
    fn test_sort_defaults_to_updated_at_desc() {
        assert_eq!(TaskSort::parse(None, None), TaskSort::default());
        assert_eq!(TaskSort::default().field, TaskSortField::UpdatedAt);
        assert_eq!(TaskSort::default().direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_recognized_fields_case_insensitive() {
        let sort = TaskSort::parse(Some("TITLE"), Some("asc"));
        assert_eq!(sort.field, TaskSortField::Title);
        assert_eq!(sort.direction, SortDirection::Asc);

        let sort = TaskSort::parse(Some("updatedAt"), Some("ASC"));
        assert_eq!(sort.field, TaskSortField::UpdatedAt);
        assert_eq!(sort.direction, SortDirection::Asc);

        let sort = TaskSort::parse(Some("created"), None);
        assert_eq!(sort.field, TaskSortField::Created);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_unknown_direction_is_descending() {
        let sort = TaskSort::parse(Some("title"), Some("upwards"));
        assert_eq!(sort.field, TaskSortField::Title);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_unknown_field_falls_back_to_default() {
        assert_eq!(TaskSort::parse(Some("password_hash"), Some("asc")), TaskSort::default());
        assert_eq!(TaskSort::parse(Some("user_id; DROP TABLE tasks"), None), TaskSort::default());
        assert_eq!(TaskSort::parse(Some(""), Some("asc")), TaskSort::default());
    }

    #[test]
    fn test_select_without_filters_is_owner_scoped() {
        let qb = select_tasks(owner(), &TaskListParams::default());
        assert_eq!(
            qb.sql(),
            "SELECT id, user_id, title, description, is_completed, category_id, created, updated_at \
             FROM tasks WHERE user_id = $1 ORDER BY updated_at DESC, id ASC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn test_select_with_all_filters() {
        let params = TaskListParams {
            filter: TaskFilter {
                category_id: Some(1),
                is_completed: Some(false),
                search: Some(" report ".to_string()),
            },
            sort: TaskSort::parse(Some("title"), Some("asc")),
            page: PageRequest::new(Some(2), Some(10), DEFAULT_TASK_PAGE_SIZE),
        };

        let qb = select_tasks(owner(), &params);
        assert_eq!(
            qb.sql(),
            "SELECT id, user_id, title, description, is_completed, category_id, created, updated_at \
             FROM tasks WHERE user_id = $1 AND category_id = $2 AND is_completed = $3 \
             AND (title ILIKE $4 ESCAPE '\\' OR description ILIKE $5 ESCAPE '\\') \
             ORDER BY title ASC, id ASC LIMIT $6 OFFSET $7"
        );
    }

    #[test]
    fn test_blank_search_adds_no_condition() {
        let filter = TaskFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };

        let qb = count_tasks(owner(), &filter);
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM tasks WHERE user_id = $1");
    }

    #[test]
    fn test_count_uses_same_filters_without_paging() {
        let filter = TaskFilter {
            is_completed: Some(true),
            ..Default::default()
        };

        let qb = count_tasks(owner(), &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND is_completed = $2"
        );
    }
}
