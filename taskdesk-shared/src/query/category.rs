//! Category list filters and sort keys

use super::{search_pattern, PageRequest, SortDirection};
use crate::models::OwnerId;
use sqlx::{Postgres, QueryBuilder};

/// Page size used when the client does not send one
pub const DEFAULT_CATEGORY_PAGE_SIZE: i64 = 50;

/// Sortable category columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySortField {
    Id,
    Description,
}

impl CategorySortField {
    /// Case-insensitive match against `id`, `description`
    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" => Some(CategorySortField::Id),
            "description" => Some(CategorySortField::Description),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            CategorySortField::Id => "id",
            CategorySortField::Description => "description",
        }
    }
}

/// Category ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySort {
    pub field: CategorySortField,
    pub direction: SortDirection,
}

impl Default for CategorySort {
    /// Lowest id first
    fn default() -> Self {
        Self {
            field: CategorySortField::Id,
            direction: SortDirection::Asc,
        }
    }
}

impl CategorySort {
    /// Parses raw query parameters
    ///
    /// A recognized field sorts descending only for `desc`. An unrecognized
    /// field yields the default order.
    pub fn parse(sort_by: Option<&str>, sort_dir: Option<&str>) -> Self {
        let field = match sort_by {
            None => CategorySortField::Id,
            Some(raw) => match CategorySortField::from_param(raw) {
                Some(field) => field,
                None => return Self::default(),
            },
        };

        let direction = match sort_dir.and_then(SortDirection::from_param) {
            Some(SortDirection::Desc) => SortDirection::Desc,
            _ => SortDirection::Asc,
        };

        Self { field, direction }
    }
}

/// Category list filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    /// Case-insensitive substring over description
    pub search: Option<String>,
}

/// Everything a category list request carries besides the owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListParams {
    pub filter: CategoryFilter,
    pub sort: CategorySort,
    pub page: PageRequest,
}

impl Default for CategoryListParams {
    fn default() -> Self {
        Self {
            filter: CategoryFilter::default(),
            sort: CategorySort::default(),
            page: PageRequest::new(None, None, DEFAULT_CATEGORY_PAGE_SIZE),
        }
    }
}

/// Builds the paged, ordered `SELECT` for an owner's categories
pub fn select_categories(
    owner: OwnerId,
    params: &CategoryListParams,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT user_id, id, description FROM categories");
    push_conditions(&mut qb, owner, &params.filter);

    qb.push(" ORDER BY ")
        .push(params.sort.field.column())
        .push(" ")
        .push(params.sort.direction.as_sql());

    if params.sort.field != CategorySortField::Id {
        qb.push(", id ASC");
    }

    qb.push(" LIMIT ")
        .push_bind(params.page.limit())
        .push(" OFFSET ")
        .push_bind(params.page.offset());

    qb
}

/// Builds the `COUNT(*)` over the same filters, without paging
pub fn count_categories(
    owner: OwnerId,
    filter: &CategoryFilter,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM categories");
    push_conditions(&mut qb, owner, filter);
    qb
}

fn push_conditions(
    qb: &mut QueryBuilder<'static, Postgres>,
    owner: OwnerId,
    filter: &CategoryFilter,
) {
    qb.push(" WHERE user_id = ").push_bind(owner.as_uuid());

    if let Some(pattern) = search_pattern(filter.search.as_deref()) {
        qb.push(" AND COALESCE(description, '') ILIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\'");
    }
}
