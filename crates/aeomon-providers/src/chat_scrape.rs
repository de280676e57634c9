//! Client for the chat-scrape relay.
//!
//! The relay drives a real chat UI through a browser-automation worker and
//! hands back the extracted answer text and cited links. Calls are slow by
//! nature, so this client is constructed with a much longer timeout than
//! the API providers. The relay signals "the UI gave no answer" with a
//! `"no_answer": true` body.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use aeomon_core::ProviderKind;

use crate::error::ProviderError;
use crate::retry::retry_with_backoff;
use crate::{elapsed_ms, parse_base_url, AnswerProvider, ProviderAnswer, RetryConfig};

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(default)]
    no_answer: bool,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the browser-automation relay.
pub struct ChatScrapeClient {
    client: Client,
    base_url: Url,
    retry: RetryConfig,
}

impl ChatScrapeClient {
    /// Creates a client for the relay at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProviderError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn new(base_url: &str, timeout_secs: u64, retry: RetryConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("aeomon/0.1 (brand-visibility-monitoring)")
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            retry,
        })
    }

    async fn request_once(&self, prompt: &str) -> Result<ProviderAnswer, ProviderError> {
        let url = self
            .base_url
            .join("ask")
            .map_err(|_| ProviderError::InvalidBaseUrl(self.base_url.to_string()))?;

        let start = Instant::now();
        let response = self
            .client
            .post(url.clone())
            .json(&json!({"prompt": prompt}))
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        let elapsed = elapsed_ms(start);

        let parsed: RelayResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        if let Some(message) = parsed.error {
            return Err(ProviderError::Api(message));
        }
        if parsed.no_answer {
            return Err(ProviderError::NoResult);
        }
        let content = parsed.answer.map(|a| a.trim().to_owned()).unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::NoResult);
        }

        Ok(ProviderAnswer {
            content,
            citations: parsed.links,
            response_time_ms: elapsed,
        })
    }
}

#[async_trait]
impl AnswerProvider for ChatScrapeClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ChatScrape
    }

    async fn call(&self, prompt: &str) -> Result<ProviderAnswer, ProviderError> {
        retry_with_backoff(self.retry.max_retries, self.retry.backoff_base_ms, || {
            self.request_once(prompt)
        })
        .await
    }
}
