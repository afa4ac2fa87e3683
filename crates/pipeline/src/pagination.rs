//! Offset pagination.
//!
//! Pages are 1-based. Offset cost grows with page depth, which is fine for an
//! admin tool with a few hundred posts.

use serde::{Deserialize, Serialize};

/// Page size used by the drafts and approval views.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// A requested page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Creates a request, clamping `page` and `per_page` to at least 1.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn page(self) -> u32 {
        self.page
    }

    pub fn per_page(self) -> u32 {
        self.per_page
    }

    /// Number of items to skip: `(page - 1) * per_page`.
    pub fn offset(self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Maximum number of items on the page.
    pub fn limit(self) -> u64 {
        u64::from(self.per_page)
    }

    /// Applies this request to an already ordered list, recording `items.len()`
    /// as the total.
    pub fn slice<T>(self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let page_items = items
            .into_iter()
            .skip(offset)
            .take(self.per_page as usize)
            .collect();
        Page::new(page_items, total, self)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the total number of matching items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            per_page: request.per_page(),
        }
    }

    /// `ceil(total / per_page)`; zero when there are no items.
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page.max(1)))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Transforms the items, keeping the paging figures.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_page_of_twenty_five() {
        let ranked: Vec<u32> = (1..=25).collect();
        let page = PageRequest::new(2, 10).slice(ranked);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn last_page_is_short_and_has_no_next() {
        let page = PageRequest::new(3, 10).slice((1..=25).collect::<Vec<u32>>());
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_next());
    }

    #[test]
    fn page_zero_is_clamped_to_first() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: Page<u32> = PageRequest::default().slice(Vec::new());
        assert_eq!(page.total_pages(), 0);
        assert!(!page.has_next());
        assert!(!page.has_prev());
    }
}
