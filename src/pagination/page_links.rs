//! Page-number list for the human-facing page control

use serde::Serialize;
use utoipa::ToSchema;

/// Label shown in place of a collapsed run of pages
pub const PAGE_BREAK_LABEL: &str = "…";

/// Page counts up to this are listed without truncation
const SHOW_ALL_THRESHOLD: u64 = 5;

/// Pages shown on each side of the current page
const NEIGHBORHOOD: u64 = 1;

/// One entry of the page control
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PageLink {
    /// Text to display (`"3"`, or `"…"` for a break)
    pub label: String,
    /// Page number, `null` for a break
    pub number: Option<u64>,
    /// Target URL, `null` for a break
    pub url: Option<String>,
    /// Whether this is the page being viewed
    pub is_active: bool,
    /// Whether this entry stands for skipped pages
    pub is_break: bool,
}

impl PageLink {
    fn page(number: u64, url: String, is_active: bool) -> Self {
        Self {
            label: number.to_string(),
            number: Some(number),
            url: Some(url),
            is_active,
            is_break: false,
        }
    }

    fn page_break() -> Self {
        Self {
            label: PAGE_BREAK_LABEL.to_string(),
            number: None,
            url: None,
            is_active: false,
            is_break: true,
        }
    }
}

/// Page numbers to display around `current`, `None` marking an ellipsis.
///
/// ```text
/// current=1,  final=5   → 1 2 3 4 5
/// current=1,  final=10  → 1 2 3 … 10
/// current=5,  final=10  → 1 … 4 5 6 … 10
/// current=10, final=10  → 1 … 8 9 10
/// ```
pub fn displayed_page_numbers(current: u64, final_page: u64) -> Vec<Option<u64>> {
    let final_page = final_page.max(1);
    let current = current.clamp(1, final_page);

    if final_page <= SHOW_ALL_THRESHOLD {
        return (1..=final_page).map(Some).collect();
    }

    let mut included = vec![
        1,
        current.saturating_sub(NEIGHBORHOOD),
        current,
        current.saturating_add(NEIGHBORHOOD),
        final_page,
    ];

    // Near either end, fill in so the visible run is never a lone page.
    if current <= 4 {
        included.extend([2, 3]);
    }
    if current.saturating_add(3) >= final_page {
        included.extend([final_page - 1, final_page - 2]);
    }

    included.retain(|n| (1..=final_page).contains(n));
    included.sort_unstable();
    included.dedup();

    let mut numbers: Vec<Option<u64>> = included.into_iter().map(Some).collect();
    if current > 4 {
        numbers.insert(1, None);
    }
    if current.saturating_add(3) < final_page {
        let last = numbers.len() - 1;
        numbers.insert(last, None);
    }
    numbers
}

/// Turn page numbers into links, marking `current` active
pub fn page_links<F>(page_numbers: &[Option<u64>], current: u64, page_url: F) -> Vec<PageLink>
where
    F: Fn(u64) -> String,
{
    page_numbers
        .iter()
        .map(|entry| match entry {
            Some(n) => PageLink::page(*n, page_url(*n), *n == current),
            None => PageLink::page_break(),
        })
        .collect()
}
