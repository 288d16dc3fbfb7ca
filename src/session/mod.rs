//! Search and pagination controller.
//!
//! [`SearchSession`] owns everything the results view shows: the filters of
//! the active search, the accumulated result list, the server's total count
//! and the loading flag. It moves between three states:
//!
//! - **Idle**: no request outstanding
//! - **Loading**: one request outstanding; new submits and load-mores are
//!   refused with [`ControllerError::Busy`]
//! - **Failed**: idle after a failed fetch, with earlier results kept
//!
//! A fetch is split in two halves so callers can drive the network however
//! they like: `begin_*` hands out a [`PendingFetch`] ticket and marks the
//! session as loading, [`SearchSession::complete`] applies the outcome. The
//! async [`SearchSession::submit`] and [`SearchSession::load_more`] wrap both
//! halves around a [`SearchBackend`].

use crate::api::{ApiError, SearchBackend};
use crate::models::{MediaItem, PageRequest, SearchFilters, SearchResultPage, DEFAULT_PAGE_SIZE};
use crate::validate::{validate_filters, FieldErrors};

/// What a fetch will do with the page it receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Fresh search: the page replaces the accumulated results
    FirstPage,
    /// Continuation: the page is appended after the accumulated results
    NextPage(u32),
}

/// Ticket for a request started by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    kind: FetchKind,
    filters: SearchFilters,
    request: PageRequest,
    generation: u64,
}

impl PendingFetch {
    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    /// Filters to send
    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    /// Page to request
    pub fn request(&self) -> PageRequest {
        self.request
    }
}

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Failed,
}

/// Result of a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub kind: FetchKind,
    /// Items on the received page
    pub received: usize,
    /// Accumulated items after merging
    pub loaded: usize,
    /// Total matches reported by the server
    pub total_count: usize,
}

/// Errors from the pagination controller
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("A search is already in progress")]
    Busy,

    #[error("Invalid filters: {0}")]
    Invalid(FieldErrors),

    #[error("All {0} results are already loaded")]
    NothingMore(usize),

    #[error("Fetch does not match the request in flight")]
    Stale,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// In-memory state of one search session
#[derive(Debug, Clone)]
pub struct SearchSession {
    draft: SearchFilters,
    active: SearchFilters,
    page_size: u32,
    current_page: u32,
    results: Vec<MediaItem>,
    total_count: usize,
    loading: bool,
    generation: u64,
    field_errors: FieldErrors,
    last_error: Option<String>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl SearchSession {
    /// Start a session with the match-all filter on page 1
    pub fn new(page_size: u32) -> Self {
        Self {
            draft: SearchFilters::default(),
            active: SearchFilters::default(),
            page_size: page_size.max(1),
            current_page: 1,
            results: Vec::new(),
            total_count: 0,
            loading: false,
            generation: 0,
            field_errors: FieldErrors::default(),
            last_error: None,
        }
    }

    // ========== READ ACCESS ==========

    pub fn state(&self) -> SessionState {
        if self.loading {
            SessionState::Loading
        } else if self.last_error.is_some() {
            SessionState::Failed
        } else {
            SessionState::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Accumulated results in arrival order
    pub fn results(&self) -> &[MediaItem] {
        &self.results
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Filters of the search the results belong to
    pub fn active_filters(&self) -> &SearchFilters {
        &self.active
    }

    /// Filters being edited
    pub fn draft(&self) -> &SearchFilters {
        &self.draft
    }

    /// Edit the draft. Never affects the active search.
    pub fn draft_mut(&mut self) -> &mut SearchFilters {
        &mut self.draft
    }

    /// Errors from the last validation
    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Message of the last failed fetch, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the server has more matches than are loaded
    pub fn has_more(&self) -> bool {
        self.total_count > self.results.len()
    }

    /// Whether a "load more" control should be enabled
    pub fn can_load_more(&self) -> bool {
        !self.loading && self.has_more()
    }

    /// Whether a "search" control should be enabled for the current draft
    pub fn can_submit(&self) -> bool {
        !self.loading && validate_filters(&self.draft).is_empty()
    }

    // ========== TRANSITIONS ==========

    /// Start a fresh search for `filters`.
    ///
    /// Validation errors are recorded and returned; on success the
    /// accumulated results are cleared and the session enters Loading.
    pub fn begin_submit(&mut self, filters: SearchFilters) -> Result<PendingFetch, ControllerError> {
        if self.loading {
            return Err(ControllerError::Busy);
        }

        let errors = validate_filters(&filters);
        self.field_errors = errors.clone();
        if !errors.is_empty() {
            tracing::debug!(%errors, "Search blocked by invalid filters");
            return Err(ControllerError::Invalid(errors));
        }

        self.results.clear();
        self.total_count = 0;
        self.current_page = 1;

        Ok(self.start(FetchKind::FirstPage, filters, PageRequest::first(self.page_size)))
    }

    /// Start a fresh search for the current draft
    pub fn begin_submit_draft(&mut self) -> Result<PendingFetch, ControllerError> {
        let draft = self.draft.clone();
        self.begin_submit(draft)
    }

    /// Request the page after the last loaded one, using the active filters
    pub fn begin_load_more(&mut self) -> Result<PendingFetch, ControllerError> {
        if self.loading {
            return Err(ControllerError::Busy);
        }
        if !self.has_more() {
            return Err(ControllerError::NothingMore(self.results.len()));
        }

        let next = PageRequest::new(self.current_page, self.page_size).next();
        let filters = self.active.clone();
        Ok(self.start(FetchKind::NextPage(next.page), filters, next))
    }

    fn start(&mut self, kind: FetchKind, filters: SearchFilters, request: PageRequest) -> PendingFetch {
        self.loading = true;
        self.generation += 1;
        tracing::info!(?kind, page = request.page, query = %filters.query, "Fetching results");

        PendingFetch {
            kind,
            filters,
            request,
            generation: self.generation,
        }
    }

    /// Apply the outcome of a fetch started with `begin_*`.
    ///
    /// A first page replaces the results, a next page is appended in server
    /// order without de-duplication. A failure keeps the results as they
    /// were.
    pub fn complete(
        &mut self,
        pending: PendingFetch,
        result: Result<SearchResultPage, ApiError>,
    ) -> Result<FetchOutcome, ControllerError> {
        if !self.loading || pending.generation != self.generation {
            return Err(ControllerError::Stale);
        }
        self.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(kind = ?pending.kind, error = %err, "Search request failed");
                self.last_error = Some(err.to_string());
                return Err(ControllerError::Api(err));
            }
        };

        let received = page.results.len();
        match pending.kind {
            FetchKind::FirstPage => {
                self.results = page.results;
                self.active = pending.filters;
                self.current_page = 1;
            }
            FetchKind::NextPage(n) => {
                self.results.extend(page.results);
                self.current_page = n;
            }
        }
        self.total_count = page.count;
        self.last_error = None;

        tracing::info!(
            received,
            loaded = self.results.len(),
            total = self.total_count,
            "Results updated"
        );

        Ok(FetchOutcome {
            kind: pending.kind,
            received,
            loaded: self.results.len(),
            total_count: self.total_count,
        })
    }

    /// Validate `filters` and fetch their first page
    pub async fn submit<B>(
        &mut self,
        backend: &B,
        filters: SearchFilters,
    ) -> Result<FetchOutcome, ControllerError>
    where
        B: SearchBackend + ?Sized,
    {
        let pending = self.begin_submit(filters)?;
        self.run(backend, pending).await
    }

    /// Validate the draft and fetch its first page
    pub async fn submit_draft<B>(&mut self, backend: &B) -> Result<FetchOutcome, ControllerError>
    where
        B: SearchBackend + ?Sized,
    {
        let pending = self.begin_submit_draft()?;
        self.run(backend, pending).await
    }

    /// Fetch and append the next page of the active search
    pub async fn load_more<B>(&mut self, backend: &B) -> Result<FetchOutcome, ControllerError>
    where
        B: SearchBackend + ?Sized,
    {
        let pending = self.begin_load_more()?;
        self.run(backend, pending).await
    }

    async fn run<B>(&mut self, backend: &B, pending: PendingFetch) -> Result<FetchOutcome, ControllerError>
    where
        B: SearchBackend + ?Sized,
    {
        tracing::debug!(
            backend = backend.name(),
            page = pending.request.page,
            size = pending.request.size,
            "Dispatching search"
        );
        let result = backend.search(&pending.filters, pending.request).await;
        if let Err(e) = &result {
            tracing::debug!(backend = backend.name(), error = %e, "Backend returned an error");
        }
        self.complete(pending, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::make_items;
    use crate::api::MockBackend;
    use crate::validate::ErrorField;

    fn page(count: usize, prefix: &str, n: usize) -> SearchResultPage {
        SearchResultPage::new(count, make_items(prefix, n))
    }

    #[test]
    fn test_new_session_defaults() {
        let session = SearchSession::default();
        assert_eq!(session.draft().query, "*");
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.page_size(), 12);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.can_load_more());
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn test_first_page_then_next_page_accumulates() {
        let backend = MockBackend::new();
        backend.push_page(page(50, "p1", 12));
        backend.push_page(page(50, "p2", 12));

        let mut session = SearchSession::new(12);
        let first = session.submit(&backend, SearchFilters::new("boats")).await.unwrap();
        assert_eq!(first.kind, FetchKind::FirstPage);
        assert_eq!(session.results().len(), 12);

        let second = session.load_more(&backend).await.unwrap();
        assert_eq!(second.kind, FetchKind::NextPage(2));
        assert_eq!(session.results().len(), 24);
        assert_eq!(session.total_count(), 50);
        assert_eq!(session.current_page(), 2);
        assert_eq!(session.results()[12].id, "p2-0");

        let requests = backend.requests();
        assert_eq!(requests[0].1, PageRequest::new(1, 12));
        assert_eq!(requests[1].1, PageRequest::new(2, 12));
    }

    #[tokio::test]
    async fn test_new_search_replaces_results() {
        let backend = MockBackend::new();
        backend.push_page(page(30, "a", 12));
        backend.push_page(page(3, "b", 3));

        let mut session = SearchSession::new(12);
        session.submit(&backend, SearchFilters::new("cats")).await.unwrap();
        session.submit(&backend, SearchFilters::new("dogs")).await.unwrap();

        assert_eq!(session.results().len(), 3);
        assert_eq!(session.total_count(), 3);
        assert_eq!(session.active_filters().query, "dogs");
        assert!(session.results().iter().all(|i| i.id.starts_with("b-")));
    }

    #[tokio::test]
    async fn test_load_more_disabled_when_everything_loaded() {
        let backend = MockBackend::new();
        backend.push_page(page(10, "x", 10));

        let mut session = SearchSession::new(12);
        session.submit(&backend, SearchFilters::default()).await.unwrap();

        assert!(!session.has_more());
        assert!(!session.can_load_more());
        let err = session.load_more(&backend).await.unwrap_err();
        assert!(matches!(err, ControllerError::NothingMore(10)));
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_results() {
        let backend = MockBackend::new();
        backend.push_page(page(50, "p1", 12));
        backend.push_error(ApiError::Network("connection reset".into()));

        let mut session = SearchSession::new(12);
        session.submit(&backend, SearchFilters::default()).await.unwrap();
        let before: Vec<String> = session.results().iter().map(|i| i.id.clone()).collect();

        let err = session.load_more(&backend).await.unwrap_err();
        assert!(matches!(err, ControllerError::Api(ApiError::Network(_))));

        let after: Vec<String> = session.results().iter().map(|i| i.id.clone()).collect();
        assert_eq!(before, after);
        assert!(!session.is_loading());
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.current_page(), 1);
        assert!(session.can_load_more());

        // the user re-triggers and the same page is requested again
        backend.push_page(page(50, "p2", 12));
        session.load_more(&backend).await.unwrap();
        let requests = backend.requests();
        assert_eq!(requests[1].1.page, 2);
        assert_eq!(requests[2].1.page, 2);
        assert_eq!(session.results().len(), 24);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_busy_guard_blocks_second_fetch() {
        let mut session = SearchSession::new(12);
        let pending = session.begin_submit(SearchFilters::default()).unwrap();
        assert_eq!(session.state(), SessionState::Loading);

        assert!(matches!(
            session.begin_submit(SearchFilters::new("other")),
            Err(ControllerError::Busy)
        ));
        assert!(matches!(session.begin_load_more(), Err(ControllerError::Busy)));
        assert!(!session.can_submit());

        session
            .complete(pending, Ok(page(40, "a", 12)))
            .unwrap();
        assert!(session.can_load_more());
    }

    #[test]
    fn test_stale_ticket_is_rejected() {
        let mut session = SearchSession::new(12);
        let first = session.begin_submit(SearchFilters::default()).unwrap();
        session.complete(first.clone(), Ok(page(40, "a", 12))).unwrap();

        assert!(matches!(
            session.complete(first, Ok(page(40, "b", 12))),
            Err(ControllerError::Stale)
        ));
        assert_eq!(session.results()[0].id, "a-0");
    }

    #[tokio::test]
    async fn test_invalid_filters_block_submission() {
        let backend = MockBackend::new();
        let mut session = SearchSession::new(12);

        let filters = SearchFilters::default().photographer("J");
        let err = session.submit(&backend, filters).await.unwrap_err();

        match err {
            ControllerError::Invalid(errors) => {
                assert!(errors.get(ErrorField::Photographer).is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(session.field_errors().get(ErrorField::Photographer).is_some());
        assert!(backend.requests().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_load_more_uses_active_filters_not_draft() {
        let backend = MockBackend::new();
        backend.push_page(page(24, "a", 12));
        backend.push_page(page(24, "b", 12));

        let mut session = SearchSession::new(12);
        session.draft_mut().query = "harbour".to_string();
        session.submit_draft(&backend).await.unwrap();

        session.draft_mut().query = "mountains".to_string();
        session.draft_mut().photographer = Some("Ansel".to_string());
        session.load_more(&backend).await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests[1].0.query, "harbour");
        assert!(requests[1].0.photographer.is_none());
        assert_eq!(session.active_filters().query, "harbour");
        assert_eq!(session.draft().query, "mountains");
    }

    #[tokio::test]
    async fn test_duplicates_across_pages_are_kept() {
        let backend = MockBackend::new();
        backend.push_page(page(4, "a", 2));
        backend.push_page(page(4, "a", 2));

        let mut session = SearchSession::new(2);
        session.submit(&backend, SearchFilters::default()).await.unwrap();
        session.load_more(&backend).await.unwrap();

        let ids: Vec<&str> = session.results().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a-0", "a-1", "a-0", "a-1"]);
    }

    #[tokio::test]
    async fn test_failed_submit_clears_previous_results() {
        let backend = MockBackend::new();
        backend.push_page(page(30, "a", 12));
        backend.push_error(ApiError::Status {
            status: 502,
            body: String::new(),
        });

        let mut session = SearchSession::new(12);
        session.submit(&backend, SearchFilters::new("one")).await.unwrap();
        assert!(session.submit(&backend, SearchFilters::new("two")).await.is_err());

        assert!(session.results().is_empty());
        assert_eq!(session.total_count(), 0);
        assert!(!session.can_load_more());
        assert_eq!(session.active_filters().query, "one");
        assert!(session.last_error().unwrap().contains("502"));
    }
}
