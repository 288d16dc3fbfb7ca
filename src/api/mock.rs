//! Mock backend for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::{ApiError, SearchBackend};
use crate::models::{MediaItem, PageRequest, SearchFilters, SearchResultPage};

/// A backend that replays queued responses and records every request.
///
/// When the queue is empty an empty page is returned.
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: Mutex<VecDeque<Result<SearchResultPage, ApiError>>>,
    requests: Mutex<Vec<(SearchFilters, PageRequest)>>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page.
    pub fn push_page(&self, page: SearchResultPage) {
        self.responses.lock().unwrap().push_back(Ok(page));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<(SearchFilters, PageRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> Result<SearchResultPage, ApiError> {
        self.requests.lock().unwrap().push((filters.clone(), page));
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(SearchResultPage::default()))
    }
}

/// Helper to create `n` items with ids `{prefix}-0 .. {prefix}-{n-1}`.
pub fn make_items(prefix: &str, n: usize) -> Vec<MediaItem> {
    (0..n)
        .map(|i| {
            let id = format!("{}-{}", prefix, i);
            MediaItem::new(
                id.clone(),
                format!("Item {}", id),
                format!("http://example.com/{}.jpg", id),
            )
        })
        .collect()
}
