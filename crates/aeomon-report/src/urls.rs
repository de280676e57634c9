//! The citation-URL pipeline for one report.
//!
//! Collects the union of citation URLs over the report's `ok` results,
//! registers them in the shared inventory, batch-extracts content for the
//! ones still pending, and classifies everything extracted. Per-URL
//! failures bump the retry counter and move on; only a total extraction
//! wipe-out (a nonempty work set with zero successes) fails the stage.

use std::collections::HashMap;

use sqlx::PgPool;

use aeomon_core::{ProviderResultStatus, UrlProcessingStatus};
use aeomon_db::{
    list_results_for_report, record_extraction_failure, record_extraction_success, select_pending,
    select_unclassified, set_url_processing, upsert_content_facts, upsert_inventory,
    UrlInventoryRow,
};
use aeomon_content::{ExtractorClient, UrlClassifier};

use crate::error::ReportError;

/// How much extracted text is handed to the classifier as a snippet.
const SNIPPET_CHARS: usize = 300;

/// Counters for one URL-pipeline run, mirrored onto the report row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlOutcome {
    pub total: u32,
    pub extracted: u32,
    pub classified: u32,
    pub failed: u32,
}

/// Runs the URL pipeline for `report_id`.
///
/// # Errors
///
/// Returns [`ReportError::Db`] on database failures. Extraction and
/// classification failures are absorbed into the outcome counters.
pub async fn process_report_urls(
    pool: &PgPool,
    extractor: &ExtractorClient,
    classifier: &UrlClassifier,
    report_id: i64,
) -> Result<UrlOutcome, ReportError> {
    set_url_processing(pool, report_id, UrlProcessingStatus::Running, 0, 0, 0).await?;

    // Union of citation URLs over the report's ok results, deduplicated by
    // inventory key at upsert time.
    let results = list_results_for_report(pool, report_id).await?;
    let mut inventory: HashMap<String, UrlInventoryRow> = HashMap::new();
    for result in &results {
        if result.provider_status != ProviderResultStatus::Ok.as_str() {
            continue;
        }
        for url in result.citation_urls() {
            let row = upsert_inventory(pool, &url).await?;
            inventory.insert(row.url_key.clone(), row);
        }
    }

    let mut outcome = UrlOutcome {
        total: u32::try_from(inventory.len()).unwrap_or(u32::MAX),
        ..UrlOutcome::default()
    };
    outcome.extracted = u32::try_from(
        inventory.values().filter(|r| r.content_extracted).count(),
    )
    .unwrap_or(u32::MAX);

    if inventory.is_empty() {
        set_url_processing(pool, report_id, UrlProcessingStatus::Complete, 0, 0, 0).await?;
        return Ok(outcome);
    }

    let keys: Vec<String> = inventory.keys().cloned().collect();

    // Extracted on an earlier run but never classified: classify from the
    // URL alone, there is no stored page content to quote.
    let stale = select_unclassified(pool, &keys).await?;
    for row in &stale {
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

    // Fresh extraction work.
    let pending = select_pending(pool, &keys).await?;
    let pending_by_url: HashMap<&str, &UrlInventoryRow> =
        pending.iter().map(|r| (r.url.as_str(), r)).collect();
    let pending_urls: Vec<String> = pending.iter().map(|r| r.url.clone()).collect();

    let extraction = extractor.extract(&pending_urls).await;

    for failure in &extraction.failures {
        if let Some(row) = pending_by_url.get(failure.url.as_str()) {
            record_extraction_failure(pool, &row.url_key, &failure.error).await?;
            outcome.failed += 1;
        }
    }

    for page in &extraction.pages {
        let Some(row) = pending_by_url.get(page.url.as_str()) else {
            continue;
        };
        record_extraction_success(pool, &row.url_key).await?;
        outcome.extracted += 1;

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

    // Everything extracted has facts now: the classifier is infallible.
    outcome.classified = outcome.extracted;

    let status = if !pending.is_empty() && extraction.pages.is_empty() {
        UrlProcessingStatus::Failed
    } else {
        UrlProcessingStatus::Complete
    };
    set_url_processing(
        pool,
        report_id,
        status,
        i32::try_from(outcome.total).unwrap_or(i32::MAX),
        i32::try_from(outcome.extracted).unwrap_or(i32::MAX),
        i32::try_from(outcome.classified).unwrap_or(i32::MAX),
    )
    .await?;

    tracing::info!(
        report_id,
        total = outcome.total,
        extracted = outcome.extracted,
        classified = outcome.classified,
        failed = outcome.failed,
        status = status.as_str(),
        "URL pipeline finished"
    );

    Ok(outcome)
}
