//! Client-side filter, sort and pagination over a fetched list
//!
//! The backend returns whole collections; list pages narrow them here. Rows
//! are raw JSON objects so one engine serves every entity.

use crate::config::TableConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl SortDirection {
    /// The other direction
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Column a table is sorted by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field path, dot-separated for nested values (`idSede.nombre`)
    pub field: String,
    /// Direction
    pub direction: SortDirection,
}

/// State of one list view: current page, page size, filter text and sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableState {
    page: u32,
    page_size: u32,
    max_page_size: u32,
    filter: String,
    sort: Option<SortSpec>,
}

impl TableState {
    /// Fresh state on page 1
    #[must_use]
    pub fn new(page_size: u32, max_page_size: u32) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            page: 1,
            page_size: page_size.clamp(1, max_page_size),
            max_page_size,
            filter: String::new(),
            sort: None,
        }
    }

    /// Fresh state using the configured page sizes
    #[must_use]
    pub fn from_config(config: &TableConfig) -> Self {
        Self::new(config.default_page_size, config.max_page_size)
    }

    /// Current page (1-based)
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Filter text
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Sort column, if any
    #[must_use]
    pub const fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Move to a page; page 0 is treated as page 1
    pub fn go_to(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Change the page size and return to page 1
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.clamp(1, self.max_page_size);
        self.page = 1;
    }

    /// Change the filter text; a different filter returns to page 1
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        let filter = filter.into().trim().to_string();
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    /// Sort by a field
    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) {
        let field = field.into();
        self.sort = if field.trim().is_empty() {
            None
        } else {
            Some(SortSpec { field, direction })
        };
    }

    /// Column-header click: same column flips direction, another column sorts ascending
    pub fn toggle_sort(&mut self, field: &str) {
        let direction = match &self.sort {
            Some(spec) if spec.field == field => spec.direction.flipped(),
            _ => SortDirection::Asc,
        };
        self.set_sort(field, direction);
    }

    /// Filter, sort and cut one page out of `rows`
    ///
    /// A page past the end is clamped to the last page.
    #[must_use]
    pub fn apply(&self, rows: &[Value]) -> TablePage<Value> {
        let needle = fold(&self.filter);
        let mut matching: Vec<&Value> = rows
            .iter()
            .filter(|row| needle.is_empty() || contains_text(row, &needle))
            .collect();

        if let Some(spec) = &self.sort {
            matching.sort_by(|a, b| compare_field(a, b, spec));
        }

        let total = matching.len() as u64;
        let pagination = PaginationMeta::new(self.page, self.page_size, total);
        let start = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(self.page_size).unwrap_or(usize::MAX);

        let rows = matching
            .into_iter()
            .skip(start)
            .take(take)
            .cloned()
            .collect();

        TablePage { rows, pagination }
    }
}

/// Pagination metadata for a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Current page (1-based)
    pub page: u32,

    /// Items per page
    pub per_page: u32,

    /// Total number of items after filtering
    pub total: u64,

    /// Total number of pages (at least 1)
    pub total_pages: u32,

    /// Whether there's a next page
    pub has_next: bool,

    /// Whether there's a previous page
    pub has_prev: bool,

    /// Next page number (if exists)
    pub next_page: Option<u32>,

    /// Previous page number (if exists)
    pub prev_page: Option<u32>,
}

impl PaginationMeta {
    /// Create pagination metadata, clamping `page` into `1..=total_pages`
    #[must_use]
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let pages = total.div_ceil(u64::from(per_page)).max(1);
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
        let page = page.clamp(1, total_pages);
        let has_next = page < total_pages;
        let has_prev = page > 1;

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next,
            has_prev,
            next_page: has_next.then(|| page + 1),
            prev_page: has_prev.then(|| page - 1),
        }
    }

    /// Index of the first row on this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

/// One page of rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage<T> {
    /// The rows on this page
    pub rows: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Lowercase and strip Spanish diacritics so "area" finds "Área"
fn fold(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => fold(text).contains(needle),
        Value::Number(number) => number.to_string().contains(needle),
        Value::Bool(flag) => flag.to_string() == needle,
        Value::Array(items) => items.iter().any(|item| contains_text(item, needle)),
        Value::Object(map) => map.values().any(|item| contains_text(item, needle)),
        Value::Null => false,
    }
}

/// Resolve a dot-separated path; a reference object stands in for its label
fn lookup<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    let value = path
        .split('.')
        .try_fold(row, |current, key| current.get(key))?;
    match value {
        Value::Object(map) => map.get("nombre").or_else(|| map.get("id")),
        Value::Null => None,
        other => Some(other),
    }
}

/// Missing values sort last in both directions
fn compare_field(a: &Value, b: &Value, spec: &SortSpec) -> Ordering {
    match (lookup(a, &spec.field), lookup(b, &spec.field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => {
            let ordering = compare_values(left, right);
            match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => fold(a).cmp(&fold(b)),
        // Mixed types: numbers before booleans before text
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

const fn rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::Bool(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) | Value::Object(_) => 3,
        Value::Null => 4,
    }
}
