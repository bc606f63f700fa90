//! HTTP retrieval backend.
//!
//! One POST per query, bounded by the configured timeout, no retry:
//!
//! ```text
//! POST {rag_service_url}
//! Content-Type: application/json
//! Authorization: Bearer {api_key}        (only when a key is configured)
//!
//! {"query": "...", "top_k": 5, "metadata_filters": {}}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use ragbridge_config::FilterConfig;
use ragbridge_core::error::RetrievalError;
use ragbridge_core::retrieval::{RetrievalRequest, RetrievalResult, Retriever};
use tracing::{debug, info, warn};

/// Longest query prefix written to the logs.
const QUERY_LOG_CHARS: usize = 50;

/// Retrieval backend reached over HTTP.
pub struct HttpRetriever {
    url: String,
    api_key: Option<String>,
    top_k: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpRetriever {
    /// Create a retriever for `url`.
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        top_k: u32,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(RetrievalError::NotConfigured);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Client(e.to_string()))?;

        Ok(Self {
            url,
            api_key: api_key.filter(|k| !k.is_empty()),
            top_k,
            timeout,
            client,
        })
    }

    /// Create a retriever from the filter settings.
    pub fn from_config(config: &FilterConfig) -> Result<Self, RetrievalError> {
        Self::new(
            config.rag_service_url.trim(),
            config.api_key().map(str::to_string),
            config.top_k,
            config.timeout(),
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> RetrievalError {
        if e.is_timeout() {
            RetrievalError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            RetrievalError::Transport(e.to_string())
        }
    }
}

impl std::fmt::Debug for HttpRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRetriever")
            .field("url", &self.url)
            .field(
                "api_key",
                &if self.api_key.is_some() { "[REDACTED]" } else { "None" },
            )
            .field("top_k", &self.top_k)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    fn name(&self) -> &str {
        "http"
    }

    async fn try_retrieve(&self, query: &str) -> Result<RetrievalResult, RetrievalError> {
        let preview: String = query.chars().take(QUERY_LOG_CHARS).collect();
        info!(query = %preview, url = %self.url, "Calling retrieval service");

        let payload = RetrievalRequest::new(query, self.top_k);

        // `.json()` also sets `Content-Type: application/json`.
        let mut request = self.client.post(&self.url).json(&payload);

        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Retrieval service returned error");
            return Err(RetrievalError::Status {
                status_code: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let result: RetrievalResult =
            serde_json::from_str(&body).map_err(|e| RetrievalError::Decode(e.to_string()))?;

        debug!(
            references = result.references.len(),
            raw = result.raw.len(),
            "Retrieval service responded"
        );

        Ok(result)
    }
}
