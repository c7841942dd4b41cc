//! List query construction
//!
//! Turns filter, sort and paging parameters into owner-scoped SQL built with
//! [`sqlx::QueryBuilder`]. User input only ever reaches the database as bind
//! parameters; column names and directions come from closed enums.
//!
//! Invalid sort input never fails. Unknown fields and directions fall back to
//! each entity's default order.
//!
//! - `category`: category filters and sort keys
//! - `task`: task filters and sort keys

pub mod category;
pub mod task;

use serde::Serialize;

/// Largest page size a client can get
pub const MAX_PAGE_SIZE: i64 = 200;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Case-insensitive match against `asc` / `desc`
    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Clamped page window
///
/// `page` is at least 1 and `page_size` is within `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Builds a page window, clamping out-of-range values
    ///
    /// Missing values take `1` and `default_size` respectively.
    pub fn new(page: Option<i64>, page_size: Option<i64>, default_size: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(default_size)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Rows to take
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Paged envelope returned by list endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    /// Rows on this page
    pub items: Vec<T>,

    /// 1-based page number
    pub page: i64,

    /// Effective page size after clamping
    pub page_size: i64,

    /// Rows matching the filters across all pages
    pub total_items: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, page: PageRequest, total_items: i64) -> Self {
        Self {
            items,
            page: page.page(),
            page_size: page.page_size(),
            total_items,
        }
    }

    /// Converts every item, keeping pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
        }
    }
}

/// Turns free-text search into an `ILIKE` substring pattern
///
/// Input is trimmed; empty or whitespace-only input means no filter. `%`, `_`
/// and `\` are escaped so they match literally.
pub fn search_pattern(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(trimmed.len() + 2);
    pattern.push('%');
    for c in trimmed.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');

    Some(pattern)
}
