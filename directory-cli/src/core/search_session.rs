//! Session state for one search query and the pages fetched for it

use crate::api::models::{PageCursor, ResultPage, SearchRequest};
use crate::error::ValidationError;

/// Category and location the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub category: String,
    pub location: String,
}

impl SearchQuery {
    pub fn new(category: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            location: location.into(),
        }
    }

    /// Both selections must be non-blank
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.category.trim().is_empty() || self.location.trim().is_empty() {
            return Err(ValidationError::MissingSelection);
        }
        Ok(())
    }

    /// Request for the first page: no token, nothing fetched yet
    pub fn first_page_request(&self) -> SearchRequest {
        SearchRequest {
            category: self.category.clone(),
            location: self.location.clone(),
            current_count: 0,
            page_token: None,
        }
    }
}

/// Pagination bookkeeping for the active query.
///
/// `result_count` is always the backend's `current_count`; it is never
/// computed from page sizes. `has_more` is only true while a cursor is held.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchSession {
    pub query: Option<SearchQuery>,
    pub result_count: u64,
    pub cursor: Option<PageCursor>,
    pub has_more: bool,
}

impl SearchSession {
    /// Back to (0, no cursor, no more pages) with no active query
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Start a fresh session for `query` and return the request for its
    /// first page
    pub fn begin(&mut self, query: SearchQuery) -> SearchRequest {
        self.reset();
        let request = query.first_page_request();
        self.query = Some(query);
        request
    }

    pub fn can_load_more(&self) -> bool {
        self.has_more && self.cursor.is_some() && self.query.is_some()
    }

    /// Request for the page after the last one fetched, if there is one
    pub fn next_page_request(&self) -> Option<SearchRequest> {
        if !self.can_load_more() {
            return None;
        }
        let query = self.query.as_ref()?;
        Some(SearchRequest {
            category: query.category.clone(),
            location: query.location.clone(),
            current_count: self.result_count,
            page_token: self.cursor.clone(),
        })
    }

    /// Fold a successfully fetched page into the session.
    ///
    /// A page that claims more results but carries no cursor, or that came
    /// back empty, ends pagination.
    pub fn apply_page(&mut self, page: &ResultPage) {
        self.result_count = page.current_count;

        let next = if page.has_more && !page.items.is_empty() {
            page.next_cursor.clone()
        } else {
            None
        };

        self.has_more = next.is_some();
        self.cursor = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Business;

    fn page(count: u64, has_more: bool, cursor: Option<&str>, items: usize) -> ResultPage {
        ResultPage {
            items: (0..items).map(|i| Business::named(&format!("B{}", i))).collect(),
            total_results: 25,
            current_count: count,
            has_more,
            next_cursor: cursor.map(PageCursor::from),
            from_cache: false,
        }
    }

    #[test]
    fn blank_selection_is_rejected() {
        assert_eq!(
            SearchQuery::new("Plumbing", "  ").validate(),
            Err(ValidationError::MissingSelection)
        );
        assert_eq!(
            SearchQuery::new("", "Austin").validate(),
            Err(ValidationError::MissingSelection)
        );
        assert!(SearchQuery::new("Plumbing", "Austin").validate().is_ok());
    }

    #[test]
    fn count_is_overwritten_not_summed() {
        let mut session = SearchSession::default();
        session.begin(SearchQuery::new("Plumbing", "Austin"));
        session.apply_page(&page(10, true, Some("tok1"), 10));
        session.apply_page(&page(11, false, None, 1));
        assert_eq!(session.result_count, 11);
    }

    #[test]
    fn has_more_without_cursor_is_downgraded() {
        let mut session = SearchSession::default();
        session.begin(SearchQuery::new("Plumbing", "Austin"));
        session.apply_page(&page(10, true, None, 10));
        assert!(!session.has_more);
        assert_eq!(session.cursor, None);
        assert_eq!(session.next_page_request(), None);
    }

    #[test]
    fn cursor_dropped_when_backend_says_no_more() {
        let mut session = SearchSession::default();
        session.begin(SearchQuery::new("Plumbing", "Austin"));
        session.apply_page(&page(10, false, Some("stale"), 10));
        assert_eq!(session.cursor, None);
    }

    #[test]
    fn next_request_carries_cursor_and_count() {
        let mut session = SearchSession::default();
        session.begin(SearchQuery::new("Plumbing", "Austin"));
        session.apply_page(&page(10, true, Some("tok1"), 10));

        let request = session.next_page_request().unwrap();
        assert_eq!(request.current_count, 10);
        assert_eq!(request.page_token, Some(PageCursor::from("tok1")));
        assert_eq!(request.category, "Plumbing");
    }

    #[test]
    fn begin_clears_previous_session() {
        let mut session = SearchSession::default();
        session.begin(SearchQuery::new("Plumbing", "Austin"));
        session.apply_page(&page(10, true, Some("tok1"), 10));

        let request = session.begin(SearchQuery::new("Roofing", "Dallas"));
        assert_eq!(session.result_count, 0);
        assert_eq!(session.cursor, None);
        assert!(!session.has_more);
        assert_eq!(request.current_count, 0);
        assert_eq!(request.page_token, None);
        assert_eq!(request.category, "Roofing");
    }
}
