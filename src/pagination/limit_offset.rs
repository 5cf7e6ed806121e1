//! Limit/offset windowing
//!
//! ```text
//! http://api.example.org/rows/?limit=100
//! http://api.example.org/rows/?offset=400&limit=100
//! ```

use std::ops::Range;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;
use utoipa::ToSchema;

use super::config::PaginationConfig;
use super::page_links::{displayed_page_numbers, page_links, PageLink};
use super::urls::{remove_query_param, replace_query_param};
use crate::domain::DataFrame;

/// A sequence the pager can measure and cut
pub trait Sliceable: Sized {
    fn len(&self) -> usize;

    /// Items at positions `range`; `range` never exceeds `len()`
    fn slice(&self, range: Range<usize>) -> Self;
}

impl Sliceable for DataFrame {
    fn len(&self) -> usize {
        DataFrame::len(self)
    }

    fn slice(&self, range: Range<usize>) -> Self {
        DataFrame::slice(self, range)
    }
}

impl<T: Clone> Sliceable for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn slice(&self, range: Range<usize>) -> Self {
        self[range].to_vec()
    }
}

/// Parse a query value as a non-negative integer.
///
/// With `strict`, zero is rejected too. `cutoff` clamps the result.
pub fn positive_int(raw: &str, strict: bool, cutoff: Option<usize>) -> Option<usize> {
    let value: i64 = raw.trim().parse().ok()?;
    if value < 0 || (strict && value == 0) {
        return None;
    }
    let value = usize::try_from(value).ok()?;
    Some(match cutoff {
        Some(max) => value.min(max),
        None => value,
    })
}

/// Last value of `key` in the query string
fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .filter(|(k, _)| k == key)
        .last()
        .map(|(_, v)| v.into_owned())
}

/// Ceiling division with floor semantics for negative numerators
fn divide_with_ceil(a: i128, b: i128) -> i128 {
    let q = a.div_euclid(b);
    if a.rem_euclid(b) != 0 {
        q + 1
    } else {
        q
    }
}

/// Body of a paginated list response
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PaginatedResponse {
    /// Number of rows across all pages
    pub count: usize,
    /// URL of the next page, `null` on the last page
    pub next: Option<String>,
    /// URL of the previous page, `null` on the first page
    pub previous: Option<String>,
    /// Rows of this page in the resource's representation
    #[schema(value_type = Object)]
    pub results: Value,
}

/// Page-link control for the current window
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PageControls {
    /// Page being viewed (1-based)
    pub current: u64,
    /// Last page number
    #[serde(rename = "final")]
    pub final_page: u64,
    /// Whether the control should be shown at all
    pub display: bool,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
    pub page_links: Vec<PageLink>,
}

impl PageControls {
    /// Render as a Bootstrap-style `<ul class="pagination">` fragment
    pub fn to_html(&self) -> String {
        let mut html = String::from("<ul class=\"pagination\">\n");

        html.push_str(&nav_item(self.previous_url.as_deref(), "Previous", "&laquo;"));
        for link in &self.page_links {
            let item = match (&link.url, link.is_break) {
                (Some(url), false) => {
                    let class = if link.is_active { " class=\"active\"" } else { "" };
                    format!(
                        "  <li{}><a href=\"{}\">{}</a></li>\n",
                        class,
                        escape_html(url),
                        link.label
                    )
                }
                _ => "  <li class=\"disabled\"><a href=\"#\"><span aria-hidden=\"true\">&hellip;</span></a></li>\n"
                    .to_string(),
            };
            html.push_str(&item);
        }
        html.push_str(&nav_item(self.next_url.as_deref(), "Next", "&raquo;"));

        html.push_str("</ul>\n");
        html
    }
}

fn nav_item(url: Option<&str>, label: &str, glyph: &str) -> String {
    match url {
        Some(url) => format!(
            "  <li><a href=\"{}\" aria-label=\"{}\"><span aria-hidden=\"true\">{}</span></a></li>\n",
            escape_html(url),
            label,
            glyph
        ),
        None => format!(
            "  <li class=\"disabled\"><a href=\"#\" aria-label=\"{}\"><span aria-hidden=\"true\">{}</span></a></li>\n",
            label, glyph
        ),
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Limit/offset pagination style
#[derive(Debug, Clone, Default)]
pub struct LimitOffsetPagination {
    config: PaginationConfig,
}

impl LimitOffsetPagination {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Requested page size, or `default_limit` when missing or malformed
    pub fn get_limit(&self, url: &Url) -> Option<usize> {
        query_value(url, &self.config.limit_query_param)
            .and_then(|raw| positive_int(&raw, true, self.config.max_limit))
            .or(self.config.default_limit)
    }

    /// Requested start position, 0 when missing or malformed
    pub fn get_offset(&self, url: &Url) -> usize {
        query_value(url, &self.config.offset_query_param)
            .and_then(|raw| positive_int(&raw, false, None))
            .unwrap_or(0)
    }

    /// Cut one page out of `items`.
    ///
    /// Returns `None` when the request carries no usable limit and there is
    /// no default, meaning the caller should return everything.
    pub fn paginate<S: Sliceable>(&self, items: &S, url: &Url) -> Option<Page<S>> {
        let Some(limit) = self.get_limit(url) else {
            debug!("No limit requested, pagination disabled");
            return None;
        };
        let offset = self.get_offset(url);
        let count = items.len();

        let window = PageWindow {
            limit,
            offset,
            count,
            url: url.clone(),
            limit_query_param: self.config.limit_query_param.clone(),
            offset_query_param: self.config.offset_query_param.clone(),
            display_page_controls: self.config.page_controls && count > limit,
        };
        debug!(limit, offset, count, "Paginating");

        Some(Page {
            items: items.slice(window.range()),
            window,
        })
    }

    /// Query parameters this style reads
    pub fn query_fields(&self) -> [&str; 2] {
        [
            self.config.limit_query_param.as_str(),
            self.config.offset_query_param.as_str(),
        ]
    }
}

/// One page cut from a sequence
#[derive(Debug, Clone)]
pub struct Page<S> {
    pub items: S,
    pub window: PageWindow,
}

impl<S> Page<S> {
    /// Wrap already-serialized items into the paginated body
    pub fn into_response(self, results: Value) -> PaginatedResponse {
        self.window.paginated_response(results)
    }
}

/// Request-scoped pagination state, fixed once the page is cut
#[derive(Debug, Clone)]
pub struct PageWindow {
    limit: usize,
    offset: usize,
    count: usize,
    url: Url,
    limit_query_param: String,
    offset_query_param: String,
    display_page_controls: bool,
}

impl PageWindow {
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn display_page_controls(&self) -> bool {
        self.display_page_controls
    }

    /// Positions of the rows on this page
    pub fn range(&self) -> Range<usize> {
        if self.count == 0 || self.offset > self.count {
            return 0..0;
        }
        self.offset..self.offset.saturating_add(self.limit).min(self.count)
    }

    pub fn next_link(&self) -> Option<String> {
        if self.offset.saturating_add(self.limit) >= self.count {
            return None;
        }

        let url = replace_query_param(&self.url, &self.limit_query_param, self.limit);
        let url = replace_query_param(&url, &self.offset_query_param, self.offset + self.limit);
        Some(url.into())
    }

    pub fn previous_link(&self) -> Option<String> {
        if self.offset == 0 {
            return None;
        }

        let url = replace_query_param(&self.url, &self.limit_query_param, self.limit);
        if self.offset <= self.limit {
            return Some(remove_query_param(&url, &self.offset_query_param).into());
        }

        let url = replace_query_param(&url, &self.offset_query_param, self.offset - self.limit);
        Some(url.into())
    }

    pub fn paginated_response(&self, results: Value) -> PaginatedResponse {
        PaginatedResponse {
            count: self.count,
            next: self.next_link(),
            previous: self.previous_link(),
            results,
        }
    }

    /// Page numbers and links for the page control
    pub fn page_controls(&self) -> PageControls {
        // Widened so extreme offsets cannot overflow the page arithmetic.
        let limit = self.limit as i128;
        let offset = self.offset as i128;
        let count = self.count as i128;

        let (mut current, final_page) = if limit > 0 {
            let current = divide_with_ceil(offset, limit) + 1;
            // Pages from the offset to the end plus pages before the offset.
            // An offset that is not a multiple of the limit adds one page.
            let final_page = divide_with_ceil(count - offset, limit) + divide_with_ceil(offset, limit);
            (current, final_page.max(1))
        } else {
            (1, 1)
        };
        if current > final_page {
            current = final_page;
        }

        let page_url = |page: u64| -> String {
            if page == 1 {
                remove_query_param(&self.url, &self.offset_query_param).into()
            } else {
                let target = offset + (page as i128 - current) * limit;
                replace_query_param(&self.url, &self.offset_query_param, target).into()
            }
        };

        let current = u64::try_from(current).unwrap_or(u64::MAX);
        let final_page = u64::try_from(final_page).unwrap_or(u64::MAX);
        let numbers = displayed_page_numbers(current, final_page);

        PageControls {
            current,
            final_page,
            display: self.display_page_controls,
            previous_url: self.previous_link(),
            next_url: self.next_link(),
            page_links: page_links(&numbers, current, page_url),
        }
    }
}
