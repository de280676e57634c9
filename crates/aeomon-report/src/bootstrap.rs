//! Assembles a [`Pipeline`] from application configuration.
//!
//! Shared by the server and the CLI so both wire the same provider set:
//! keyed providers are skipped (with a warning) when their API key is
//! absent, and the completion reconciler accounts for the missing passes.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;

use aeomon_content::{ContentError, ExtractorClient, UrlClassifier};
use aeomon_core::AppConfig;
use aeomon_providers::{
    AnswerLlmClient, AnswerProvider, ChatScrapeClient, CompletionsClient, ProviderError,
    RetryConfig, WebSearchClient,
};

use crate::orchestrator::{Pipeline, PipelineConfig};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Builds the full pipeline from `config`, connected to `pool`.
///
/// # Errors
///
/// Returns [`BootstrapError`] if any client base URL is invalid or an HTTP
/// client cannot be constructed.
pub fn build_pipeline(pool: PgPool, config: &AppConfig) -> Result<Pipeline, BootstrapError> {
    let retry = RetryConfig {
        max_retries: config.provider_max_retries,
        backoff_base_ms: config.provider_backoff_base_ms,
    };

    let mut providers: Vec<Arc<dyn AnswerProvider>> = Vec::with_capacity(3);

    match &config.answer_llm_api_key {
        Some(key) => providers.push(Arc::new(AnswerLlmClient::new(
            &config.answer_llm_url,
            key,
            config.provider_request_timeout_secs,
            retry,
        )?)),
        None => tracing::warn!("AEOMON_ANSWER_LLM_API_KEY not set; answer-llm pass will not run"),
    }

    match &config.web_search_api_key {
        Some(key) => providers.push(Arc::new(WebSearchClient::new(
            &config.web_search_url,
            key,
            config.provider_request_timeout_secs,
            retry,
        )?)),
        None => tracing::warn!("AEOMON_WEB_SEARCH_API_KEY not set; web-search pass will not run"),
    }

    providers.push(Arc::new(ChatScrapeClient::new(
        &config.chat_scrape_url,
        config.chat_scrape_timeout_secs,
        retry,
    )?));

    if config.completions_api_key.is_none() {
        tracing::warn!(
            "AEOMON_COMPLETIONS_API_KEY not set; classification and share-of-voice will degrade"
        );
    }
    let completions_key = config.completions_api_key.as_deref().unwrap_or_default();
    let completions = CompletionsClient::new(
        &config.completions_url,
        completions_key,
        config.provider_request_timeout_secs,
        retry,
    )?;
    let classifier_completions = CompletionsClient::new(
        &config.completions_url,
        completions_key,
        config.provider_request_timeout_secs,
        retry,
    )?;

    if config.extractor_api_key.is_none() {
        tracing::warn!("AEOMON_EXTRACTOR_API_KEY not set; URL extraction will fail per URL");
    }
    let extractor = ExtractorClient::new(
        &config.extractor_url,
        config.extractor_api_key.as_deref().unwrap_or_default(),
        config.provider_request_timeout_secs,
    )?;

    Ok(Pipeline::new(
        pool,
        providers,
        extractor,
        UrlClassifier::new(classifier_completions),
        completions,
        PipelineConfig {
            inter_prompt_delay: Duration::from_millis(config.inter_prompt_delay_ms),
            inter_brand_delay: Duration::from_millis(config.inter_brand_delay_ms),
        },
    ))
}
