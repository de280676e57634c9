//! Completion reconciliation for one report.
//!
//! Sole writer of `generated`/`status='completed'`/`completed_at`. The rule
//! itself is the pure `derive_completion` in `aeomon-analysis`; this module
//! snapshots the report's flags, applies the rule, and persists the verdict.
//! Idempotent: reconciling an already-completed report is a no-op rewrite of
//! the same values.

use chrono::NaiveDate;
use sqlx::PgPool;

use aeomon_analysis::{closeout_status_for, derive_completion, expired_status_for, CompletionFlags};
use aeomon_core::{ProviderKind, ReportStatus};
use aeomon_db::{get_report, mark_completed, mark_running, set_provider_status};

use crate::error::ReportError;

/// Reconciles the completion state of `report_id` as of `today`.
///
/// Returns whether the report is now complete.
///
/// # Errors
///
/// Returns [`ReportError::Db`] if reading or writing the report fails.
pub async fn reconcile_completion(
    pool: &PgPool,
    report_id: i64,
    today: NaiveDate,
) -> Result<bool, ReportError> {
    let report = get_report(pool, report_id).await?;

    let web_search = report.provider_status(ProviderKind::WebSearch);
    let chat_scrape = report.provider_status(ProviderKind::ChatScrape);
    let flags = CompletionFlags {
        answer_llm: report.provider_status(ProviderKind::AnswerLlm),
        web_search,
        chat_scrape,
        url_processing: report.url_status(),
        report_is_today: report.report_date == today,
    };
    let decision = derive_completion(flags);

    if decision.is_complete {
        // Closing out a past-date report with an unattempted web-search
        // pass records it as expired rather than leaving not_started.
        if !flags.report_is_today {
            let effective = expired_status_for(ProviderKind::WebSearch, web_search);
            if effective != web_search {
                set_provider_status(pool, report_id, ProviderKind::WebSearch, effective).await?;
            }
        }
        // A secondary pass still `running` here was left by a crashed
        // invocation; it closes as failed so the generated report carries
        // only terminal pass statuses. The primary pass cannot be running
        // when the report is complete.
        for (kind, current) in [
            (ProviderKind::WebSearch, web_search),
            (ProviderKind::ChatScrape, chat_scrape),
        ] {
            let effective = closeout_status_for(current);
            if effective != current {
                tracing::warn!(report_id, provider = %kind, "stale running pass closed as failed");
                set_provider_status(pool, report_id, kind, effective).await?;
            }
        }
        mark_completed(pool, report_id).await?;
        tracing::info!(report_id, "report reconciled complete");
        return Ok(true);
    }

    // An incomplete report stays (or returns to) running, unless a fatal
    // error already marked it failed.
    if report.status != ReportStatus::Failed.as_str() {
        mark_running(pool, report_id).await?;
    }

    Ok(false)
}
