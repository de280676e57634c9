//! Client for the batched content-extraction API.
//!
//! The API takes a list of URLs and returns raw page content per URL plus a
//! separate list of per-URL failures. Requests are chunked to the API's
//! batch limit; a whole-batch transport failure is reported as individual
//! failures for every URL in that batch so the caller's retry accounting
//! stays per-URL.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::ContentError;

/// Maximum URLs per extraction API call.
pub const EXTRACT_BATCH_SIZE: usize = 20;

/// Successfully extracted page content.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedPage {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    pub raw_content: String,
}

/// A per-URL extraction failure.
#[derive(Debug, Clone, Deserialize)]
pub struct FailedExtraction {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<ExtractedPage>,
    #[serde(default)]
    failed_results: Vec<FailedExtraction>,
}

/// The combined outcome of extracting a set of URLs.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub pages: Vec<ExtractedPage>,
    pub failures: Vec<FailedExtraction>,
}

/// Client for the content-extraction API.
pub struct ExtractorClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl ExtractorClient {
    /// Creates a client for the extraction API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ContentError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("aeomon/0.1 (brand-visibility-monitoring)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|_| ContentError::InvalidBaseUrl(base_url.to_owned()))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Extracts content for all `urls`, chunking into API-sized batches.
    ///
    /// Transport failures on a batch are downgraded to per-URL failures for
    /// the batch's URLs; later batches still run. The outcome therefore
    /// always covers every input URL exactly once.
    pub async fn extract(&self, urls: &[String]) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome::default();
        for batch in urls.chunks(EXTRACT_BATCH_SIZE) {
            match self.extract_batch(batch).await {
                Ok(response) => {
                    outcome.pages.extend(response.results);
                    outcome.failures.extend(response.failed_results);
                }
                Err(e) => {
                    tracing::warn!(
                        batch_size = batch.len(),
                        error = %e,
                        "extraction batch failed, recording per-URL failures"
                    );
                    outcome.failures.extend(batch.iter().map(|url| FailedExtraction {
                        url: url.clone(),
                        error: e.to_string(),
                    }));
                }
            }
        }
        outcome
    }

    async fn extract_batch(&self, urls: &[String]) -> Result<ExtractResponse, ContentError> {
        let url = self
            .base_url
            .join("extract")
            .map_err(|_| ContentError::InvalidBaseUrl(self.base_url.to_string()))?;

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(&json!({"urls": urls}))
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| ContentError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}
