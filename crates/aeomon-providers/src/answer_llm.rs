//! Client for the search-augmented chat-completions API.
//!
//! The primary provider: report completion requires this pass to finish.
//! The API follows the common chat-completions shape (`choices[0].message
//! .content`) and adds a top-level `citations` array of source URLs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use aeomon_core::ProviderKind;

use crate::error::ProviderError;
use crate::retry::retry_with_backoff;
use crate::{elapsed_ms, parse_base_url, AnswerProvider, ProviderAnswer, RetryConfig};

const DEFAULT_MODEL: &str = "sonar";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

/// Client for the search-augmented answer API.
///
/// Use [`AnswerLlmClient::new`] for production or
/// [`AnswerLlmClient::with_base_url`] to point at a mock server in tests.
pub struct AnswerLlmClient {
    client: Client,
    api_key: String,
    base_url: Url,
    model: String,
    retry: RetryConfig,
}

impl AnswerLlmClient {
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
        Self::with_base_url(base_url, api_key, timeout_secs, retry)
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`AnswerLlmClient::new`].
    pub fn with_base_url(
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
            model: DEFAULT_MODEL.to_owned(),
            retry,
        })
    }

    async fn request_once(&self, prompt: &str) -> Result<ProviderAnswer, ProviderError> {
        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|_| ProviderError::InvalidBaseUrl(self.base_url.to_string()))?;
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let start = Instant::now();
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        let elapsed = elapsed_ms(start);

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_owned())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::NoResult);
        }

        Ok(ProviderAnswer {
            content,
            citations: parsed.citations,
            response_time_ms: elapsed,
        })
    }
}

#[async_trait]
impl AnswerProvider for AnswerLlmClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AnswerLlm
    }

    async fn call(&self, prompt: &str) -> Result<ProviderAnswer, ProviderError> {
        retry_with_backoff(self.retry.max_retries, self.retry.backoff_base_ms, || {
            self.request_once(prompt)
        })
        .await
    }
}
