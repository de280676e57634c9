//! Client for the web-search answer API.
//!
//! Synthesizes an answer the way a search results page reads it: the answer
//! box first (when present), then the top organic snippets. Citations are
//! the organic result links. An empty organic list is
//! [`ProviderError::NoResult`], not an error.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use aeomon_core::ProviderKind;

use crate::error::ProviderError;
use crate::retry::retry_with_backoff;
use crate::{elapsed_ms, parse_base_url, AnswerProvider, ProviderAnswer, RetryConfig};

/// How many organic snippets contribute to the synthesized answer text.
const SNIPPET_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer_box: Option<AnswerBox>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct AnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// Client for the web-search answer API.
pub struct WebSearchClient {
    client: Client,
    api_key: String,
    base_url: Url,
    retry: RetryConfig,
}

impl WebSearchClient {
    /// Creates a client pointed at the configured production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProviderError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
        retry: RetryConfig,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("aeomon/0.1 (brand-visibility-monitoring)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
            retry,
        })
    }

    async fn request_once(&self, prompt: &str) -> Result<ProviderAnswer, ProviderError> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|_| ProviderError::InvalidBaseUrl(self.base_url.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", prompt)
            .append_pair("api_key", &self.api_key);

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let text = response.text().await?;
        let elapsed = elapsed_ms(start);

        let parsed: SearchResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        if parsed.organic_results.is_empty() && parsed.answer_box.is_none() {
            return Err(ProviderError::NoResult);
        }

        let mut sections: Vec<String> = Vec::new();
        if let Some(answer_box) = &parsed.answer_box {
            if let Some(text) = answer_box.answer.as_deref().or(answer_box.snippet.as_deref()) {
                let text = text.trim();
                if !text.is_empty() {
                    sections.push(text.to_owned());
                }
            }
        }
        for result in parsed.organic_results.iter().take(SNIPPET_LIMIT) {
            match (result.title.as_deref(), result.snippet.as_deref()) {
                (Some(title), Some(snippet)) => sections.push(format!("{title}: {snippet}")),
                (None, Some(snippet)) => sections.push(snippet.to_owned()),
                (Some(title), None) => sections.push(title.to_owned()),
                (None, None) => {}
            }
        }
        let content = sections.join("\n\n");
        if content.is_empty() {
            return Err(ProviderError::NoResult);
        }

        let citations = parsed
            .organic_results
            .iter()
            .filter_map(|r| r.link.clone())
            .collect();

        Ok(ProviderAnswer {
            content,
            citations,
            response_time_ms: elapsed,
        })
    }
}

#[async_trait]
impl AnswerProvider for WebSearchClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::WebSearch
    }

    async fn call(&self, prompt: &str) -> Result<ProviderAnswer, ProviderError> {
        retry_with_backoff(self.retry.max_retries, self.retry.backoff_base_ms, || {
            self.request_once(prompt)
        })
        .await
    }
}
