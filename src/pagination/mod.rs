//! Limit/offset pagination over in-memory sequences
//!
//! - `config`: page-size defaults, clamps and parameter names
//! - `limit_offset`: the windowing itself plus next/previous links
//! - `page_links`: ellipsis-truncated page numbers for a page control
//! - `urls`: query-string rewriting

pub mod config;
pub mod limit_offset;
pub mod page_links;
pub mod urls;

pub use config::PaginationConfig;
pub use limit_offset::{
    positive_int, LimitOffsetPagination, Page, PageControls, PageWindow, PaginatedResponse,
    Sliceable,
};
pub use page_links::{displayed_page_numbers, page_links, PageLink, PAGE_BREAK_LABEL};
pub use urls::{remove_query_param, replace_query_param};
