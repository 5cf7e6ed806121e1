use serde::{Deserialize, Serialize};
use validator::Validate;

/// Limit/offset pagination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size when the request names none. `None` leaves such requests
    /// unpaginated.
    #[validate(range(min = 1))]
    pub default_limit: Option<usize>,
    /// Upper clamp for a requested page size
    #[validate(range(min = 1))]
    pub max_limit: Option<usize>,
    /// Query parameter carrying the page size
    #[validate(length(min = 1))]
    pub limit_query_param: String,
    /// Query parameter carrying the start position
    #[validate(length(min = 1))]
    pub offset_query_param: String,
    /// Whether the page-link control is offered
    pub page_controls: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: None,
            max_limit: None,
            limit_query_param: "limit".to_string(),
            offset_query_param: "offset".to_string(),
            page_controls: true,
        }
    }
}

impl PaginationConfig {
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }

    pub fn with_max_limit(mut self, limit: usize) -> Self {
        self.max_limit = Some(limit);
        self
    }
}
