//! Generic chat-completions client for classification and extraction calls.
//!
//! Unlike the answer providers, this client is not asked open questions: it
//! runs fixed system prompts that demand structured JSON output. Models
//! habitually wrap JSON in Markdown code fences, so [`strip_code_fences`]
//! runs before parsing.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::ProviderError;
use crate::retry::retry_with_backoff;
use crate::{parse_base_url, RetryConfig};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

/// Client for a plain chat-completions endpoint.
pub struct CompletionsClient {
    client: Client,
    api_key: String,
    base_url: Url,
    model: String,
    retry: RetryConfig,
}

impl CompletionsClient {
    /// Creates a client for the completions endpoint at `base_url`.
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
            model: DEFAULT_MODEL.to_owned(),
            retry,
        })
    }

    /// Runs one completion and returns the raw message content.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoResult`] on an empty completion, and
    /// transport/deserialize errors otherwise.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        retry_with_backoff(self.retry.max_retries, self.retry.backoff_base_ms, || {
            self.request_once(system, user)
        })
        .await
    }

    /// Runs one completion and parses the content as JSON, tolerating
    /// Markdown code fences around the payload.
    ///
    /// # Errors
    ///
    /// Same as [`CompletionsClient::complete`], plus
    /// [`ProviderError::Deserialize`] if the fenced content is not JSON.
    pub async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let content = self.complete(system, user).await?;
        let stripped = strip_code_fences(&content);
        serde_json::from_str(stripped).map_err(|e| ProviderError::Deserialize {
            context: "completion content".to_owned(),
            source: e,
        })
    }

    async fn request_once(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|_| ProviderError::InvalidBaseUrl(self.base_url.to_string()))?;
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;

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

        Ok(content)
    }
}

/// Removes a surrounding Markdown code fence (```json ... ``` or ``` ... ```)
/// if present; otherwise returns the trimmed input unchanged.
#[must_use]
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop a language tag on the opening fence line.
    let rest = match rest.split_once('\n') {
        Some((first_line, body)) if first_line.chars().all(|c| c.is_ascii_alphanumeric()) => body,
        _ => rest,
    };
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let fenced = "```json\n{\"category\": \"review\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"category\": \"review\"}");
    }

    #[test]
    fn strips_bare_fence() {
        let fenced = "```\n[1, 2]\n```";
        assert_eq!(strip_code_fences(fenced), "[1, 2]");
    }

    #[test]
    fn leaves_unfenced_content_alone() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn leaves_unterminated_fence_alone() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "```json\n{\"a\": 1}");
    }
}
