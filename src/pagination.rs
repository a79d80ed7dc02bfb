//! Page bookkeeping and result accumulation.
//!
//! [`Pagination`] owns the current page number and the list of results loaded
//! so far for the current filter set. Page 1 replaces the list, later pages
//! append to it, and the page number never exceeds the configured cap.

use crate::types::{AnimeSummary, MAX_PAGE, SearchResponse};

/// Page number and accumulated results for one filter set.
#[derive(Debug, Clone)]
pub struct Pagination {
    page: u32,
    max_page: u32,
    items: Vec<AnimeSummary>,
    has_next_page: bool,
}

impl Pagination {
    /// Creates an empty controller on page 1 capped at `max_page`.
    ///
    /// A cap of zero is treated as one.
    pub fn new(max_page: u32) -> Self {
        Self {
            page: 1,
            max_page: max_page.max(1),
            items: Vec::new(),
            has_next_page: false,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn max_page(&self) -> u32 {
        self.max_page
    }

    pub fn items(&self) -> &[AnimeSummary] {
        &self.items
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    /// `true` once the page number reached the cap.
    pub fn is_capped(&self) -> bool {
        self.page >= self.max_page
    }

    /// Whether a "load more" trigger is worth showing.
    pub fn can_request_more(&self) -> bool {
        self.has_next_page && !self.is_capped()
    }

    /// Advances to the next page unless capped or a load is still pending.
    ///
    /// `load_pending` covers both a scheduled and an in-flight fetch, which
    /// includes a page-1 reload after a filter change. `has_next_page` is not
    /// consulted. Returns whether the page changed.
    pub fn request_more(&mut self, load_pending: bool) -> bool {
        if load_pending || self.is_capped() {
            return false;
        }
        self.page += 1;
        true
    }

    /// Steps back from a later page whose load failed, so the next
    /// [`request_more`](Self::request_more) asks for it again.
    ///
    /// Page 1 is never rewound. Returns whether the page changed.
    pub fn rewind(&mut self, failed_page: u32) -> bool {
        if failed_page <= 1 || self.page != failed_page {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Starts a fresh result list for a new query or filter set.
    pub fn reset(&mut self) {
        self.page = 1;
        self.items.clear();
        self.has_next_page = false;
    }

    /// Folds one page of results into the list.
    pub fn merge_response(&mut self, page: u32, response: SearchResponse) {
        if page == 1 {
            self.items = response.results;
        } else {
            self.items.extend(response.results);
        }
        self.has_next_page = response.has_next_page;
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(MAX_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anime(id: &str) -> AnimeSummary {
        AnimeSummary::new(id, id.to_uppercase())
    }

    fn ids(pagination: &Pagination) -> Vec<&str> {
        pagination.items().iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_merge_replaces_then_appends() {
        let mut pagination = Pagination::default();
        pagination.merge_response(1, SearchResponse::new(vec![anime("a"), anime("b")], true));
        assert!(pagination.request_more(false));
        pagination.merge_response(2, SearchResponse::new(vec![anime("c")], false));

        assert_eq!(ids(&pagination), vec!["a", "b", "c"]);
        assert!(!pagination.has_next_page());

        pagination.merge_response(1, SearchResponse::new(vec![anime("z")], true));
        assert_eq!(ids(&pagination), vec!["z"]);
        assert!(pagination.has_next_page());
    }

    #[test]
    fn test_request_more_is_capped() {
        let mut pagination = Pagination::default();
        for _ in 0..20 {
            pagination.merge_response(
                pagination.page(),
                SearchResponse::new(vec![anime("x")], true),
            );
            pagination.request_more(false);
            assert!(pagination.page() <= MAX_PAGE);
        }
        assert_eq!(pagination.page(), MAX_PAGE);
        assert!(pagination.is_capped());
        assert!(!pagination.can_request_more());
        assert!(!pagination.request_more(false));
    }

    #[test]
    fn test_request_more_waits_for_reload() {
        let mut pagination = Pagination::default();
        assert!(!pagination.request_more(true));
        assert_eq!(pagination.page(), 1);
    }

    #[test]
    fn test_reset() {
        let mut pagination = Pagination::new(3);
        pagination.merge_response(1, SearchResponse::new(vec![anime("a")], true));
        pagination.request_more(false);
        pagination.request_more(false);
        assert!(pagination.is_capped());

        pagination.reset();
        assert_eq!(pagination.page(), 1);
        assert!(pagination.items().is_empty());
        assert!(!pagination.has_next_page());
        assert!(!pagination.is_capped());
    }

    #[test]
    fn test_rewind_after_failed_page() {
        let mut pagination = Pagination::default();
        pagination.merge_response(1, SearchResponse::new(vec![anime("a")], true));
        assert!(!pagination.rewind(1));

        pagination.request_more(false);
        assert_eq!(pagination.page(), 2);
        assert!(!pagination.rewind(3));
        assert!(pagination.rewind(2));
        assert_eq!(pagination.page(), 1);
        assert!(pagination.can_request_more());

        assert!(pagination.request_more(false));
        assert_eq!(pagination.page(), 2);
    }
}
