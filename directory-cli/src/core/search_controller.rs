//! SearchController - drives paged searches against the directory backend
//!
//! The controller owns the session state for the active query and is the only
//! thing that mutates it. Each operation has a single suspend point (the
//! backend call); overlapping calls are turned away with `FetchOutcome::Busy`.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::backend::SearchBackend;
use super::render::{RenderDirective, ResultRenderer};
use super::search_session::{SearchQuery, SearchSession};
use crate::api::models::ResultPage;
use crate::error::SearchError;

/// What a search or load-more call did
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A page was fetched and handed to the renderer
    Page(ResultPage),
    /// No cursor held, nothing was requested
    NothingToLoad,
    /// Another request is still pending, nothing was requested
    Busy,
}

impl FetchOutcome {
    pub fn page(&self) -> Option<&ResultPage> {
        match self {
            FetchOutcome::Page(page) => Some(page),
            _ => None,
        }
    }
}

/// Marks a request as in flight; cleared on drop, including when the pending
/// future is dropped before completing.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SearchController<B, R> {
    backend: B,
    renderer: R,
    session: Mutex<SearchSession>,
    in_flight: AtomicBool,
}

impl<B: SearchBackend, R: ResultRenderer> SearchController<B, R> {
    pub fn new(backend: B, renderer: R) -> Self {
        Self {
            backend,
            renderer,
            session: Mutex::new(SearchSession::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Snapshot of the current session
    pub fn session(&self) -> SearchSession {
        self.session.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Drop the active session. Ignored while a request is pending.
    pub fn reset(&self) {
        if let Some(_guard) = InFlight::acquire(&self.in_flight) {
            self.session.lock().reset();
        }
    }

    /// Start a new session for `query` and fetch its first page
    pub async fn start_search(&self, query: SearchQuery) -> Result<FetchOutcome, SearchError> {
        if let Err(e) = query.validate() {
            warn!(target: "search", "Rejected search: {}", e);
            return Err(e.into());
        }

        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!(target: "search", "Search ignored, a request is already pending");
            return Ok(FetchOutcome::Busy);
        };

        info!(
            target: "search",
            "Searching '{}' in '{}'", query.category, query.location
        );

        let request = self.session.lock().begin(query);

        match self.backend.search(&request).await {
            Ok(page) => {
                let show_load_more = {
                    let mut session = self.session.lock();
                    session.apply_page(&page);
                    session.has_more
                };
                info!(
                    target: "search",
                    "First page: {} items, current_count={}, total={}, from_cache={}",
                    page.items.len(),
                    page.current_count,
                    page.total_results,
                    page.from_cache
                );
                self.renderer
                    .render(RenderDirective::for_page(&page, true, show_load_more));
                Ok(FetchOutcome::Page(page))
            }
            Err(e) => {
                warn!(target: "search", "Search failed ({}): {}", e.kind(), e);
                self.session.lock().reset();
                Err(e)
            }
        }
    }

    /// Fetch the page after the last one, if the session holds a cursor
    pub async fn load_more(&self) -> Result<FetchOutcome, SearchError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!(target: "search", "Load more ignored, a request is already pending");
            return Ok(FetchOutcome::Busy);
        };

        let Some(request) = self.session.lock().next_page_request() else {
            debug!(target: "search", "No page token available");
            return Ok(FetchOutcome::NothingToLoad);
        };

        debug!(
            target: "search",
            "Loading more with current_count={}", request.current_count
        );

        match self.backend.search(&request).await {
            Ok(page) => {
                let show_load_more = {
                    let mut session = self.session.lock();
                    session.apply_page(&page);
                    session.has_more
                };
                info!(
                    target: "search",
                    "Next page: {} items, current_count={}, has_more={}",
                    page.items.len(),
                    page.current_count,
                    show_load_more
                );
                self.renderer
                    .render(RenderDirective::for_page(&page, false, show_load_more));
                Ok(FetchOutcome::Page(page))
            }
            Err(e) => {
                // session is left as it was so the same page can be retried
                warn!(target: "search", "Load more failed ({}): {}", e.kind(), e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Business, PageCursor, SearchRequest};
    use crate::error::ValidationError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ResultPage, SearchError>>>,
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl ScriptedBackend {
        fn with(replies: Vec<Result<ResultPage, SearchError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<SearchRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        async fn search(&self, request: &SearchRequest) -> Result<ResultPage, SearchError> {
            self.requests.lock().push(request.clone());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(SearchError::network(None, None)))
        }
    }

    /// Parks every call until released
    #[derive(Default)]
    struct GatedBackend {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SearchBackend for GatedBackend {
        async fn search(&self, _request: &SearchRequest) -> Result<ResultPage, SearchError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(page(&["A"], 1, false, None))
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        directives: Mutex<Vec<RenderDirective>>,
    }

    impl RecordingRenderer {
        fn all(&self) -> Vec<RenderDirective> {
            self.directives.lock().clone()
        }

        fn last(&self) -> RenderDirective {
            self.directives.lock().last().cloned().unwrap()
        }
    }

    impl ResultRenderer for RecordingRenderer {
        fn render(&self, directive: RenderDirective) {
            self.directives.lock().push(directive);
        }
    }

    fn page(names: &[&str], current: u64, has_more: bool, next: Option<&str>) -> ResultPage {
        ResultPage {
            items: names.iter().map(|n| Business::named(n)).collect(),
            total_results: 25,
            current_count: current,
            has_more,
            next_cursor: next.map(PageCursor::from),
            from_cache: false,
        }
    }

    fn plumbing() -> SearchQuery {
        SearchQuery::new("Plumbing", "Austin")
    }

    fn controller(
        replies: Vec<Result<ResultPage, SearchError>>,
    ) -> SearchController<ScriptedBackend, RecordingRenderer> {
        SearchController::new(ScriptedBackend::with(replies), RecordingRenderer::default())
    }

    #[tokio::test]
    async fn first_page_sets_session_and_clears_display() {
        let c = controller(vec![Ok(page(&["A", "B"], 10, true, Some("tok1")))]);

        let outcome = c.start_search(plumbing()).await.unwrap();
        assert_eq!(outcome.page().unwrap().items.len(), 2);

        let session = c.session();
        assert_eq!(session.result_count, 10);
        assert_eq!(session.cursor, Some(PageCursor::from("tok1")));
        assert!(session.has_more);

        let directive = c.renderer().last();
        assert!(directive.clear);
        assert_eq!(directive.items, vec![Business::named("A"), Business::named("B")]);
        assert!(directive.show_load_more);
        assert_eq!(directive.total_label, "Found 25 results (showing 10)");

        let calls = c.backend().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].current_count, 0);
        assert_eq!(calls[0].page_token, None);
    }

    #[tokio::test]
    async fn load_more_appends_and_finishes() {
        let c = controller(vec![
            Ok(page(&["A", "B"], 10, true, Some("tok1"))),
            Ok(page(&["C"], 11, false, None)),
        ]);

        c.start_search(plumbing()).await.unwrap();
        c.load_more().await.unwrap();

        let session = c.session();
        assert_eq!(session.result_count, 11);
        assert_eq!(session.cursor, None);
        assert!(!session.has_more);

        let directive = c.renderer().last();
        assert!(!directive.clear);
        assert_eq!(directive.items, vec![Business::named("C")]);
        assert!(!directive.show_load_more);

        let calls = c.backend().calls();
        assert_eq!(calls[1].current_count, 10);
        assert_eq!(calls[1].page_token, Some(PageCursor::from("tok1")));
        assert_eq!(calls[1].category, "Plumbing");
        assert_eq!(calls[1].location, "Austin");
    }

    #[tokio::test]
    async fn result_count_trusts_backend_over_page_sizes() {
        // backend reports 40 after a two-item page
        let c = controller(vec![
            Ok(page(&["A", "B"], 20, true, Some("tok1"))),
            Ok(page(&["C", "D"], 40, true, Some("tok2"))),
        ]);

        c.start_search(plumbing()).await.unwrap();
        assert_eq!(c.session().result_count, 20);
        c.load_more().await.unwrap();
        assert_eq!(c.session().result_count, 40);
    }

    #[tokio::test]
    async fn missing_location_never_hits_network() {
        let c = controller(vec![]);

        let err = c
            .start_search(SearchQuery::new("Plumbing", ""))
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::Validation(ValidationError::MissingSelection));
        assert!(c.backend().calls().is_empty());
        assert!(c.renderer().all().is_empty());
    }

    #[tokio::test]
    async fn load_more_without_cursor_is_a_noop() {
        let c = controller(vec![]);

        let before = c.session();
        assert_eq!(c.load_more().await.unwrap(), FetchOutcome::NothingToLoad);
        assert_eq!(c.session(), before);
        assert!(c.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn load_more_after_last_page_is_a_noop() {
        let c = controller(vec![Ok(page(&["A"], 1, false, None))]);

        c.start_search(plumbing()).await.unwrap();
        assert_eq!(c.load_more().await.unwrap(), FetchOutcome::NothingToLoad);
        assert_eq!(c.backend().calls().len(), 1);
    }

    #[tokio::test]
    async fn has_more_without_token_is_downgraded() {
        let c = controller(vec![Ok(page(&["A", "B"], 10, true, None))]);

        c.start_search(plumbing()).await.unwrap();

        let session = c.session();
        assert!(!session.has_more);
        assert_eq!(session.cursor, None);
        assert!(!c.renderer().last().show_load_more);
    }

    #[tokio::test]
    async fn failed_load_more_keeps_position() {
        let c = controller(vec![
            Ok(page(&["A", "B"], 10, true, Some("tok1"))),
            Err(SearchError::network(Some(503), None)),
            Ok(page(&["C"], 11, false, None)),
        ]);

        c.start_search(plumbing()).await.unwrap();
        let before = c.session();

        assert!(c.load_more().await.is_err());
        assert_eq!(c.session(), before);
        assert_eq!(c.renderer().all().len(), 1);

        // retry resumes from the same cursor
        c.load_more().await.unwrap();
        let calls = c.backend().calls();
        assert_eq!(calls[1], calls[2]);
        assert_eq!(c.session().result_count, 11);
    }

    #[tokio::test]
    async fn failed_search_leaves_empty_session() {
        let c = controller(vec![
            Ok(page(&["A", "B"], 10, true, Some("tok1"))),
            Err(SearchError::Backend("quota exceeded".into())),
        ]);

        c.start_search(plumbing()).await.unwrap();
        let err = c
            .start_search(SearchQuery::new("Roofing", "Dallas"))
            .await
            .unwrap_err();

        assert_eq!(err, SearchError::Backend("quota exceeded".into()));
        assert_eq!(c.session(), SearchSession::default());
        assert_eq!(c.load_more().await.unwrap(), FetchOutcome::NothingToLoad);
    }

    #[tokio::test]
    async fn empty_first_page_signals_no_results() {
        let c = controller(vec![Ok(page(&[], 0, false, None))]);

        c.start_search(plumbing()).await.unwrap();

        let directive = c.renderer().last();
        assert!(directive.clear);
        assert!(directive.no_results);
        assert!(!directive.show_load_more);
    }

    #[tokio::test]
    async fn empty_load_more_page_completes_quietly() {
        let c = controller(vec![
            Ok(page(&["A"], 10, true, Some("tok1"))),
            Ok(page(&[], 10, true, Some("tok2"))),
        ]);

        c.start_search(plumbing()).await.unwrap();
        let outcome = c.load_more().await.unwrap();
        assert!(outcome.page().unwrap().items.is_empty());

        let session = c.session();
        assert!(!session.has_more);
        assert_eq!(session.cursor, None);

        let directive = c.renderer().last();
        assert!(!directive.no_results);
        assert!(!directive.clear);
    }

    #[tokio::test]
    async fn new_search_resets_previous_session() {
        let c = controller(vec![
            Ok(page(&["A", "B"], 10, true, Some("tok1"))),
            Ok(page(&["X"], 1, false, None)),
        ]);

        c.start_search(plumbing()).await.unwrap();
        c.start_search(SearchQuery::new("Roofing", "Dallas"))
            .await
            .unwrap();

        let calls = c.backend().calls();
        assert_eq!(calls[1].current_count, 0);
        assert_eq!(calls[1].page_token, None);
        assert_eq!(c.session().result_count, 1);
        assert!(c.renderer().last().clear);
    }

    #[tokio::test]
    async fn overlapping_calls_are_turned_away() {
        let controller = Arc::new(SearchController::new(
            GatedBackend::default(),
            RecordingRenderer::default(),
        ));

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.start_search(plumbing()).await })
        };
        controller.backend().entered.notified().await;

        assert!(controller.is_busy());
        assert_eq!(
            controller.start_search(plumbing()).await.unwrap(),
            FetchOutcome::Busy
        );
        assert_eq!(controller.load_more().await.unwrap(), FetchOutcome::Busy);

        controller.backend().release.notify_one();
        let first = pending.await.unwrap().unwrap();
        assert!(first.page().is_some());
        assert!(!controller.is_busy());
        assert_eq!(controller.renderer().all().len(), 1);
    }

    #[tokio::test]
    async fn dropped_request_releases_the_guard() {
        let controller = SearchController::new(GatedBackend::default(), RecordingRenderer::default());

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), controller.start_search(plumbing()))
                .await;
        assert!(timed_out.is_err());
        assert!(!controller.is_busy());

        controller.backend().release.notify_one();
        let outcome = controller.start_search(plumbing()).await.unwrap();
        assert!(outcome.page().is_some());
    }

    #[tokio::test]
    async fn reset_clears_session() {
        let c = controller(vec![Ok(page(&["A"], 10, true, Some("tok1")))]);
        c.start_search(plumbing()).await.unwrap();

        c.reset();
        assert_eq!(c.session(), SearchSession::default());
        assert_eq!(c.load_more().await.unwrap(), FetchOutcome::NothingToLoad);
    }
}
