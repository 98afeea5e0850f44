//! Pagination query parameter extractor.

use serde::{Deserialize, Serialize};

use schoolhub_core::types::pagination::PageRequest;

/// Query parameters for paginated endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Page number (1-based, default: 1).
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page (default: 25, max: 100).
    #[serde(default = "default_page_size", alias = "limit")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    25
}

impl PaginationParams {
    /// Converts to a clamped `PageRequest`.
    pub fn into_page_request(self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let params = PaginationParams {
            page: 0,
            page_size: 500,
        };
        let req = params.into_page_request();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, 100);
    }
}
