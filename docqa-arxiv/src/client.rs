//! arXiv API client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{ArxivError, Result};
use crate::feed::parse_feed;
use crate::paper::Paper;

/// The public arXiv query endpoint.
pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";

/// Number of papers returned when the caller does not choose.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Searches a paper catalogue by free-text query.
#[async_trait]
pub trait PaperSearch: Send + Sync {
    /// Return up to `max_results` papers ranked by relevance.
    async fn search(&self, query: &str, max_results: usize) -> docqa_rag::Result<Vec<Paper>>;
}

/// Queries the arXiv Atom API.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_arxiv::{ArxivClient, DEFAULT_MAX_RESULTS, PaperSearch};
///
/// let papers = ArxivClient::new().search("retrieval augmented generation", DEFAULT_MAX_RESULTS).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ArxivClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl Default for ArxivClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArxivClient {
    /// Create a client for the public endpoint.
    pub fn new() -> Self {
        Self { http: reqwest::Client::new(), base_url: DEFAULT_BASE_URL.into(), timeout: None }
    }

    /// Query another endpoint, such as a mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Run a relevance-sorted search over all fields.
    ///
    /// A blank query returns no papers without contacting the API.
    ///
    /// # Errors
    ///
    /// Returns [`ArxivError::Timeout`] if the client timeout elapses,
    /// [`ArxivError::Http`] on other transport failures or an error status,
    /// and [`ArxivError::Feed`] if the response cannot be parsed.
    pub async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("blank arXiv query, skipping request");
            return Ok(Vec::new());
        }

        let params = [
            ("search_query", format!("all:{query}")),
            ("max_results", max_results.to_string()),
            ("sortBy", "relevance".to_string()),
        ];
        let body = self.request(&params).await.map_err(|e| match self.timeout {
            Some(timeout) if e.is_timeout() => ArxivError::Timeout(timeout),
            _ => ArxivError::Http(e),
        })?;

        let mut papers = parse_feed(&body)?;
        papers.truncate(max_results);
        Ok(papers)
    }

    async fn request(&self, params: &[(&str, String)]) -> reqwest::Result<String> {
        self.http
            .get(&self.base_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> docqa_rag::Result<Vec<Paper>> {
        info!(query, max_results, "searching arXiv");
        let papers = self.fetch(query, max_results).await?;
        info!(paper_count = papers.len(), "arXiv search finished");
        Ok(papers)
    }
}
