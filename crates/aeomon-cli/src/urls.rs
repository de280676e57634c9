//! `urls` command: maintenance over the shared citation-URL inventory.

use std::collections::HashMap;

use clap::Subcommand;
use sqlx::PgPool;

use aeomon_content::{ExtractorClient, UrlClassifier};
use aeomon_core::AppConfig;
use aeomon_db::{
    record_extraction_failure, record_extraction_success, reset_capped_urls, select_backfill,
    select_unclassified_backlog, upsert_content_facts, UrlInventoryRow,
};
use aeomon_providers::{CompletionsClient, RetryConfig};

const SNIPPET_CHARS: usize = 300;

/// Sub-commands available under `urls`.
#[derive(Debug, Subcommand)]
pub enum UrlsCommands {
    /// Reset retry-capped URLs and rerun extraction and classification
    Backfill {
        /// Maximum number of URLs to process
        #[arg(long, default_value = "50")]
        limit: i64,
    },
}

pub(crate) async fn run(
    pool: &PgPool,
    config: &AppConfig,
    command: UrlsCommands,
) -> anyhow::Result<()> {
    match command {
        UrlsCommands::Backfill { limit } => run_backfill(pool, config, limit.clamp(1, 1_000)).await,
    }
}

/// Manual recovery path for the inventory: lift the retry cap, re-extract
/// what is still pending, and classify anything extracted without facts.
async fn run_backfill(pool: &PgPool, config: &AppConfig, limit: i64) -> anyhow::Result<()> {
    let extractor = ExtractorClient::new(
        &config.extractor_url,
        config.extractor_api_key.as_deref().unwrap_or_default(),
        config.provider_request_timeout_secs,
    )?;
    let completions = CompletionsClient::new(
        &config.completions_url,
        config.completions_api_key.as_deref().unwrap_or_default(),
        config.provider_request_timeout_secs,
        RetryConfig {
            max_retries: config.provider_max_retries,
            backoff_base_ms: config.provider_backoff_base_ms,
        },
    )?;
    let classifier = UrlClassifier::new(completions);

    let reset = reset_capped_urls(pool).await?;
    println!("{reset} retry-capped URL(s) reset");

    let pending = select_backfill(pool, limit).await?;
    let mut extracted = 0u32;
    let mut failed = 0u32;

    if pending.is_empty() {
        println!("no URLs pending extraction");
    } else {
        let pending_by_url: HashMap<&str, &UrlInventoryRow> =
            pending.iter().map(|r| (r.url.as_str(), r)).collect();
        let pending_urls: Vec<String> = pending.iter().map(|r| r.url.clone()).collect();

        let extraction = extractor.extract(&pending_urls).await;

        for failure in &extraction.failures {
            if let Some(row) = pending_by_url.get(failure.url.as_str()) {
                record_extraction_failure(pool, &row.url_key, &failure.error).await?;
                failed += 1;
            }
        }

        for page in &extraction.pages {
            let Some(row) = pending_by_url.get(page.url.as_str()) else {
                continue;
            };
            record_extraction_success(pool, &row.url_key).await?;
            extracted += 1;

            let snippet: String = page.raw_content.chars().take(SNIPPET_CHARS).collect();
            let classification = classifier
                .classify(&row.url, page.title.as_deref(), Some(&snippet))
                .await;
            upsert_content_facts(
                pool,
                &row.url_key,
                page.title.as_deref(),
                Some(&page.raw_content),
                classification.category,
                classification.confidence,
                classification.version,
            )
            .await?;
        }

        println!(
            "{} URL(s) pending: {extracted} extracted, {failed} failed",
            pending.len()
        );
    }

    // Extracted on earlier runs but never classified: no stored page
    // content, so the classifier works from the URL alone.
    let backlog = select_unclassified_backlog(pool, limit).await?;
    for row in &backlog {
        let classification = classifier.classify(&row.url, None, None).await;
        upsert_content_facts(
            pool,
            &row.url_key,
            None,
            None,
            classification.category,
            classification.confidence,
            classification.version,
        )
        .await?;
    }
    if !backlog.is_empty() {
        println!("{} previously extracted URL(s) classified", backlog.len());
    }

    Ok(())
}
