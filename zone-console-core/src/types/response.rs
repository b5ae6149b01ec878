//! API response related type definitions

use serde::{Deserialize, Serialize};

use super::report::{BulkDeleteItem, ReconciliationResult};

/// API response wrapper type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Success or not
    pub success: bool,
    /// response data
    pub data: Option<T>,
    /// Human-readable outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Paging block of list endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }
}

/// Paging block as sent by the list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_count: u32,
    pub total_pages: u32,
}

/// Page request parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Server-side search term, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn new(page: u32, page_size: u32, search: Option<String>) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            search: search.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// One server page of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Items in the current page.
    pub items: Vec<T>,
    /// Current page number.
    pub page: u32,
    /// Page size used for this request.
    pub page_size: u32,
    /// Total number of items across all pages.
    pub total_count: u32,
    /// Total number of pages.
    pub total_pages: u32,
    /// Whether there are more pages after this one.
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response, computing `total_pages` and `has_more`.
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total_count: u32) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(page_size)
        };
        let has_more = u64::from(page) * u64::from(page_size) < u64::from(total_count);
        Self {
            items,
            page,
            page_size,
            total_count,
            total_pages,
            has_more,
        }
    }

    /// Build from the wire paging block
    pub fn from_pagination(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            items,
            page: pagination.page,
            page_size: pagination.per_page,
            total_count: pagination.total_count,
            total_pages: pagination.total_pages,
            has_more: pagination.page < pagination.total_pages,
        }
    }
}

/// Response of a bulk apply of record lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRecordsResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: Vec<ReconciliationResult>,
}

/// Response of the batched delete endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<BulkDeleteItem>,
    #[serde(default)]
    pub total_count: usize,
}
