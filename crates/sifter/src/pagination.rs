//! Pagination stage: page state, bounds arithmetic and navigation.
//!
//! [`Pagination`] holds the requested page and the page size. The page that
//! is actually shown is always clamped into `[1, max(1, total_pages)]` when
//! read, so a result set that shrinks under the current page never yields
//! an out-of-range slice. Navigation clamps too; no page request is an
//! error.

use std::ops::{Range, RangeInclusive};

use serde::Serialize;

use crate::config::DEFAULT_PAGE_SIZE;

/// Bounds of one page within a result set of `total_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Page shown, 1-based, clamped.
    pub current_page: usize,
    /// Records per page.
    pub page_size: usize,
    /// Records across all pages.
    pub total_items: usize,
    /// `ceil(total_items / page_size)`; 0 when there are no records.
    pub total_pages: usize,
    /// 1-based index of the first record shown, 0 when empty.
    pub start_item: usize,
    /// 1-based index of the last record shown, 0 when empty.
    pub end_item: usize,
}

impl PageInfo {
    /// Computes page bounds for a requested page.
    pub fn new(requested_page: usize, page_size: usize, total_items: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size);
        let current_page = requested_page.clamp(1, total_pages.max(1));
        let (start_item, end_item) = if total_items == 0 {
            (0, 0)
        } else {
            (
                (current_page - 1) * page_size + 1,
                (current_page * page_size).min(total_items),
            )
        };
        PageInfo {
            current_page,
            page_size,
            total_items,
            total_pages,
            start_item,
            end_item,
        }
    }

    /// Index range of the shown page within the full result list.
    pub fn range(&self) -> Range<usize> {
        if self.total_items == 0 {
            0..0
        } else {
            self.start_item - 1..self.end_item
        }
    }

    /// Returns `true` if a page precedes the current one.
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Returns `true` if a page follows the current one.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Page numbers for a pager: at most `max` consecutive pages, centered
    /// on the current page where the bounds allow.
    ///
    /// ```
    /// use sifter::PageInfo;
    ///
    /// let info = PageInfo::new(5, 10, 200);
    /// assert_eq!(info.page_window(5), 3..=7);
    /// assert_eq!(PageInfo::new(1, 10, 200).page_window(5), 1..=5);
    /// assert_eq!(PageInfo::new(20, 10, 200).page_window(5), 16..=20);
    /// ```
    pub fn page_window(&self, max: usize) -> RangeInclusive<usize> {
        let last = self.total_pages.max(1);
        let width = max.clamp(1, last);
        let start = self
            .current_page
            .saturating_sub(width / 2)
            .clamp(1, last + 1 - width);
        start..=start + width - 1
    }
}

/// Requested page and page size of a list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    current_page: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// Starts on page 1. A page size of 0 is raised to 1.
    pub fn new(page_size: usize) -> Self {
        Pagination {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    /// The requested page, before clamping against the result size.
    pub fn requested_page(&self) -> usize {
        self.current_page
    }

    /// Records per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Bounds of the page shown for a result set of `total_items`.
    pub fn info(&self, total_items: usize) -> PageInfo {
        PageInfo::new(self.current_page, self.page_size, total_items)
    }

    /// Changes the page size. The requested page is kept as is and gets
    /// clamped on the next read.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// Returns to page 1.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Jumps to page `page`, clamped into `[1, max(1, total_pages)]`.
    pub fn go_to(&mut self, page: i64, total_items: usize) {
        let last = total_items.div_ceil(self.page_size).max(1);
        self.current_page = page.clamp(1, last as i64) as usize;
    }

    /// Jumps to the first page.
    pub fn first(&mut self, total_items: usize) {
        self.go_to(1, total_items);
    }

    /// Jumps to the last page.
    pub fn last(&mut self, total_items: usize) {
        self.go_to(i64::MAX, total_items);
    }

    /// Moves one page back from the page shown.
    pub fn previous(&mut self, total_items: usize) {
        let shown = self.info(total_items).current_page as i64;
        self.go_to(shown - 1, total_items);
    }

    /// Moves one page forward from the page shown.
    pub fn next(&mut self, total_items: usize) {
        let shown = self.info(total_items).current_page as i64;
        self.go_to(shown + 1, total_items);
    }
}

/// Returns the slice of `items` shown on the page described by `info`.
pub fn page_slice<'a, T>(items: &'a [T], info: &PageInfo) -> &'a [T] {
    let range = info.range();
    &items[range.start.min(items.len())..range.end.min(items.len())]
}
