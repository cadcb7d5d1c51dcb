//! Page arithmetic for the pagination bar.

use serde::Serialize;

/// Number of pages needed for `total_count` hits, never less than 1.
///
/// A zero page size is treated as 1.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// The visible slice of page buttons plus navigation flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub pages: Vec<u32>,
    pub current_page: u32,
    pub total_pages: u32,
    pub can_go_prev: bool,
    pub can_go_next: bool,
}

/// Compute the page-button window centered on `current_page`.
///
/// The window is `max_buttons` wide, shifted to stay within
/// `[1, total_pages]`, and shrinks when there are fewer pages.
///
/// ```
/// use bookfinder::search::compute_window;
///
/// let window = compute_window(1, 100, 20, 5);
/// assert_eq!(window.pages, vec![1, 2, 3, 4, 5]);
/// assert!(!window.can_go_prev);
/// assert!(window.can_go_next);
/// ```
pub fn compute_window(
    current_page: u32,
    total_count: u64,
    page_size: u32,
    max_buttons: u32,
) -> PageWindow {
    let total = total_pages(total_count, page_size);
    let current = current_page.clamp(1, total);

    let pages = if max_buttons == 0 {
        Vec::new()
    } else {
        let span = max_buttons - 1;
        let start = current.saturating_sub(max_buttons / 2).max(1);
        let end = start.saturating_add(span).min(total);
        let start = end.saturating_sub(span).max(1);
        (start..=end).collect()
    };

    PageWindow {
        pages,
        current_page,
        total_pages: total,
        can_go_prev: current_page > 1,
        can_go_next: current_page < total,
    }
}

/// Current position within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl Pagination {
    pub fn new(current_page: u32, page_size: u32, total_count: u64) -> Self {
        Self {
            current_page: current_page.max(1),
            page_size,
            total_count,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// Target page if `page` is in range and differs from the current one.
    pub fn go_to(&self, page: u32) -> Option<u32> {
        (page >= 1 && page <= self.total_pages() && page != self.current_page).then_some(page)
    }

    pub fn next(&self) -> Option<u32> {
        self.can_go_next().then(|| self.current_page + 1)
    }

    pub fn prev(&self) -> Option<u32> {
        self.can_go_prev().then(|| self.current_page - 1)
    }

    pub fn window(&self, max_buttons: u32) -> PageWindow {
        compute_window(
            self.current_page,
            self.total_count,
            self.page_size,
            max_buttons,
        )
    }
}
