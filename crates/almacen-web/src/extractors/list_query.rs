//! List view query parameters

use crate::extractors::ExtractorError;
use almacen_core::{SortDirection, TableState, config::TableConfig};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Page, page size, filter and sort of a list request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ListQuery {
    /// Page number (1-based)
    #[validate(range(min = 1, max = 100_000))]
    pub page: Option<u32>,

    /// Rows per page
    #[validate(range(min = 1, max = 1000))]
    #[serde(alias = "limit", alias = "pageSize")]
    pub per_page: Option<u32>,

    /// Filter text
    #[validate(length(max = 200))]
    #[serde(alias = "filter", alias = "search")]
    pub q: Option<String>,

    /// Field to sort by
    #[validate(length(min = 1, max = 100))]
    pub sort: Option<String>,

    /// Sort direction
    #[serde(alias = "order")]
    pub dir: Option<SortDirection>,
}

impl ListQuery {
    /// Table state for this request, within the configured page sizes
    #[must_use]
    pub fn table_state(&self, config: &TableConfig) -> TableState {
        let mut state = TableState::from_config(config);
        if let Some(per_page) = self.per_page {
            state.set_page_size(per_page);
        }
        if let Some(filter) = &self.q {
            state.set_filter(filter.as_str());
        }
        if let Some(sort) = &self.sort {
            state.set_sort(sort.as_str(), self.dir.unwrap_or_default());
        }
        if let Some(page) = self.page {
            state.go_to(page);
        }
        state
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = ExtractorError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();

        let list_query: Self = serde_urlencoded::from_str(query).map_err(|e| {
            ExtractorError::bad_request(format!("Invalid list parameters: {e}"))
        })?;

        list_query.validate().map_err(|errors| {
            ExtractorError::bad_request("Invalid list parameters")
                .with_details(serde_json::json!({ "fields": errors.to_string() }))
        })?;

        Ok(list_query)
    }
}
