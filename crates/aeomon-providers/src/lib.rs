//! Answer-provider clients for the daily report pipeline.
//!
//! Each provider answers a tracked prompt from a different vantage point:
//! [`AnswerLlmClient`] asks a search-augmented chat-completions API (the
//! primary provider), [`WebSearchClient`] assembles an answer from a web
//! search API's answer box and organic snippets, and [`ChatScrapeClient`]
//! talks to an HTTP relay in front of a browser-automation worker. All
//! implement [`AnswerProvider`], so the pass runner treats them uniformly.
//!
//! [`CompletionsClient`] is the odd one out: a plain chat-completions
//! client used for classification and entity extraction, not for answering
//! tracked prompts.

use async_trait::async_trait;
use reqwest::Url;

use aeomon_core::ProviderKind;

pub mod answer_llm;
pub mod chat_scrape;
pub mod completions;
pub mod error;
pub mod retry;
pub mod web_search;

pub use answer_llm::AnswerLlmClient;
pub use chat_scrape::ChatScrapeClient;
pub use completions::CompletionsClient;
pub use error::ProviderError;
pub use retry::retry_with_backoff;
pub use web_search::WebSearchClient;

/// A usable answer from a provider.
#[derive(Debug, Clone)]
pub struct ProviderAnswer {
    /// The answer text the provider produced for the prompt.
    pub content: String,
    /// URLs the provider cited, in the order it reported them.
    pub citations: Vec<String>,
    /// Wall-clock time of the provider call.
    pub response_time_ms: u64,
}

/// A provider that can answer a tracked prompt.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Which provider this is; decides the result row's `provider` column.
    fn kind(&self) -> ProviderKind;

    /// Asks the provider to answer `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoResult`] when the provider succeeded but
    /// had nothing usable to say, and transport/API errors otherwise.
    async fn call(&self, prompt: &str) -> Result<ProviderAnswer, ProviderError>;
}

/// Retry settings shared by the provider clients.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

impl RetryConfig {
    /// No retries at all; used by tests and one-shot CLI paths.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }
}

// Normalise: ensure the base URL ends with exactly one slash so that
// Url::join appends to the path rather than replacing the last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ProviderError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|_| ProviderError::InvalidBaseUrl(base_url.to_owned()))
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base_url_appends_single_slash() {
        let url = parse_base_url("https://api.example.com/v1").expect("valid");
        assert_eq!(url.as_str(), "https://api.example.com/v1/");

        let url = parse_base_url("https://api.example.com/v1///").expect("valid");
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn parse_base_url_rejects_garbage() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ProviderError::InvalidBaseUrl(_))
        ));
    }
}
