//! HTTP implementation of the archive search API.

use async_trait::async_trait;
use url::Url;

use super::{ApiError, SearchBackend};
use crate::config::ApiConfig;
use crate::models::{
    parse_calendar_date, PageRequest, SearchFilters, SearchResultPage, WILDCARD_QUERY,
};
use crate::utils::HttpClient;

/// Path of the search endpoint, relative to the base URL
pub const SEARCH_PATH: &str = "api/v1/search";

/// Client for `GET {base}/api/v1/search`.
///
/// The base URL is injected at construction so the client never reads
/// global state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: HttpClient,
    endpoint: Url,
}

impl ApiClient {
    /// Create a client for the archive at `base_url`
    pub fn new(base_url: &str, client: HttpClient) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url.trim())?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(SEARCH_PATH)?;

        Ok(Self { client, endpoint })
    }

    /// Create a client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = HttpClient::from_config(config)?;
        Self::new(&config.base_url, client)
    }

    /// Fully resolved search endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SearchBackend for ApiClient {
    async fn search(
        &self,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> Result<SearchResultPage, ApiError> {
        let params = build_query(filters, page);
        tracing::debug!(endpoint = %self.endpoint, ?params, "Searching archive");

        let response = self
            .client
            .client()
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to search archive: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(status = status.as_u16(), error = %e, "Failed to read error body");
                    String::new()
                }
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let result: SearchResultPage = serde_json::from_slice(&body)?;

        tracing::debug!(
            count = result.count,
            returned = result.results.len(),
            page = page.page,
            "Archive search completed"
        );
        Ok(result)
    }
}

/// Build the query string parameters for a search.
///
/// Optional filters that are absent or empty are left out entirely. An empty
/// or whitespace-only query becomes the wildcard `*`; any other query is sent
/// untrimmed. Dates are sent as `YYYY-MM-DD`; a value that does not parse is
/// passed through unchanged for the server to reject.
pub fn build_query(filters: &SearchFilters, page: PageRequest) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(6);

    let query = if filters.query.trim().is_empty() {
        WILDCARD_QUERY.to_string()
    } else {
        filters.query.clone()
    };
    params.push(("query", query));

    if let Some(photographer) = filters.photographer.as_deref().filter(|p| !p.is_empty()) {
        params.push(("photographer", photographer.to_string()));
    }

    for (name, value) in [("from_date", &filters.from_date), ("to_date", &filters.to_date)] {
        if let Some(raw) = value.as_deref().filter(|v| !v.is_empty()) {
            let formatted = parse_calendar_date(raw)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| raw.to_string());
            params.push((name, formatted));
        }
    }

    params.push(("page", page.page.to_string()));
    params.push(("size", page.size.to_string()));
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    fn client_for(base: &str) -> ApiClient {
        ApiClient::new(base, HttpClient::new().unwrap()).unwrap()
    }

    #[test]
    fn test_empty_query_becomes_wildcard() {
        let params = build_query(&SearchFilters::new(""), PageRequest::default());
        assert_eq!(param(&params, "query"), Some("*"));
    }

    #[test]
    fn test_whitespace_query_becomes_wildcard() {
        let params = build_query(&SearchFilters::new("   \t"), PageRequest::default());
        assert_eq!(param(&params, "query"), Some("*"));

        let params = build_query(&SearchFilters::new(" pier "), PageRequest::default());
        assert_eq!(param(&params, "query"), Some(" pier "));
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(client_for("http://localhost:8000").name(), "archive");
        assert_eq!(crate::api::MockBackend::new().name(), "mock");
    }

    #[test]
    fn test_empty_photographer_is_omitted() {
        let filters = SearchFilters::new("harbour").photographer("");
        let params = build_query(&filters, PageRequest::default());
        assert_eq!(param(&params, "query"), Some("harbour"));
        assert!(param(&params, "photographer").is_none());
    }

    #[test]
    fn test_dates_are_sent_as_iso_dates() {
        let filters = SearchFilters::default()
            .from_date("2021/3/7")
            .to_date("2021-12-24T18:00:00Z");
        let params = build_query(&filters, PageRequest::new(3, 24));
        assert_eq!(param(&params, "from_date"), Some("2021-03-07"));
        assert_eq!(param(&params, "to_date"), Some("2021-12-24"));
        assert_eq!(param(&params, "page"), Some("3"));
        assert_eq!(param(&params, "size"), Some("24"));
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let params = build_query(&SearchFilters::default(), PageRequest::default());
        let names: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(names, vec!["query", "page", "size"]);
    }

    #[test]
    fn test_endpoint_resolution() {
        assert_eq!(
            client_for("http://localhost:8000").endpoint().as_str(),
            "http://localhost:8000/api/v1/search"
        );
        assert_eq!(
            client_for("https://example.com/archive").endpoint().as_str(),
            "https://example.com/archive/api/v1/search"
        );
        assert_eq!(
            client_for("https://example.com/archive/").endpoint().as_str(),
            "https://example.com/archive/api/v1/search"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClient::new("not a url", HttpClient::new().unwrap()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl(_)));
        assert!(!err.is_network());
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "*".into()),
                Matcher::UrlEncoded("photographer".into(), "Jane Doe".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("size".into(), "12".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"count": 50, "results": [
                    {"id": "1", "title": "Pier", "image": "https://img.example/1.jpg",
                     "metadata": {"image_id": "1", "photographer": "Jane Doe"}}
                ], "next_page": 2}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let filters = SearchFilters::new("").photographer("Jane Doe");
        let page = client.search(&filters, PageRequest::default()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.count, 50);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].title, "Pier");
        assert_eq!(page.next_page, Some(2));
    }

    #[tokio::test]
    async fn test_empty_fields_never_reach_the_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/search")
            .match_query(Matcher::Regex(r"^query=\*&page=1&size=12$".into()))
            .with_status(200)
            .with_body(r#"{"count": 0, "results": []}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let filters = SearchFilters::new("")
            .photographer("")
            .from_date("")
            .to_date("");
        client.search(&filters, PageRequest::default()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .search(&SearchFilters::default(), PageRequest::default())
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, ref body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .search(&SearchFilters::default(), PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = client_for("http://127.0.0.1:1");
        let err = client
            .search(&SearchFilters::default(), PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
