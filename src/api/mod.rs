//! Archive search API.
//!
//! [`SearchBackend`] is the seam between the pagination controller and the
//! network. [`ApiClient`] talks to the real `GET /api/v1/search` endpoint;
//! [`MockBackend`] replays canned pages in tests.

mod client;
pub mod mock;

pub use client::{build_query, ApiClient, SEARCH_PATH};
pub use mock::MockBackend;

use async_trait::async_trait;

use crate::models::{PageRequest, SearchFilters, SearchResultPage};

/// A service that can answer a filtered, paged search.
#[async_trait]
pub trait SearchBackend: Send + Sync + std::fmt::Debug {
    /// Human-readable name used in log output
    fn name(&self) -> &str {
        "archive"
    }

    /// Fetch one page of results for the given filters
    async fn search(
        &self,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> Result<SearchResultPage, ApiError>;
}

/// Errors that can occur when talking to the search API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a valid result page
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured base URL cannot be used
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Whether this is a failed fetch, as opposed to a setup problem.
    ///
    /// Fetch failures leave already loaded results in place and can be
    /// retried by the user.
    pub fn is_network(&self) -> bool {
        !matches!(self, ApiError::InvalidBaseUrl(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(format!("JSON: {}", err))
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidBaseUrl(err.to_string())
    }
}
