//! One provider's pass over a brand's tracked prompts.
//!
//! The core guarantee: one bad prompt cannot abort a pass. Every prompt gets
//! exactly one upserted result row per pass, whatever happens — `ok` with
//! the analyzed answer, `no_result`, or `error` with the message. The fixed
//! inter-prompt delay exists purely to respect third-party rate limits.

use std::time::Duration;

use serde_json::json;
use sqlx::PgPool;

use aeomon_analysis::analyze;
use aeomon_core::{ProviderResultStatus, ProviderStatus};
use aeomon_db::{set_provider_counts, set_provider_status, upsert_prompt_result, NewPromptResult, PromptRow};
use aeomon_providers::{AnswerProvider, ProviderError};

use crate::error::ReportError;

/// Per-pass tallies, mirrored onto the report's counter columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub attempted: u32,
    pub ok: u32,
    pub no_result: u32,
    pub errors: u32,
}

/// The coarse status written after a pass: `failed` only when every
/// attempted prompt failed to produce an answer; partial success is still
/// `complete`.
#[must_use]
pub fn coarse_status(outcome: PassOutcome) -> ProviderStatus {
    if outcome.attempted > 0 && outcome.ok == 0 {
        ProviderStatus::Failed
    } else {
        ProviderStatus::Complete
    }
}

/// Runs `provider` over all `prompts` for one report.
///
/// # Errors
///
/// Returns [`ReportError::Db`] only on database failures; provider failures
/// are recorded per prompt and never propagate.
#[allow(clippy::too_many_arguments)]
pub async fn run_provider_pass(
    pool: &PgPool,
    provider: &dyn AnswerProvider,
    report_id: i64,
    prompts: &[PromptRow],
    brand_name: &str,
    competitors: &[String],
    inter_prompt_delay: Duration,
) -> Result<PassOutcome, ReportError> {
    let kind = provider.kind();
    set_provider_status(pool, report_id, kind, ProviderStatus::Running).await?;

    let mut outcome = PassOutcome::default();
    for (index, prompt) in prompts.iter().enumerate() {
        if index > 0 && !inter_prompt_delay.is_zero() {
            tokio::time::sleep(inter_prompt_delay).await;
        }
        outcome.attempted += 1;

        let result = match provider.call(&prompt.text).await {
            Ok(answer) => {
                outcome.ok += 1;
                let analysis = analyze(&answer.content, brand_name, competitors);
                NewPromptResult {
                    report_id,
                    prompt_id: prompt.id,
                    provider: kind,
                    provider_status: ProviderResultStatus::Ok,
                    answer_text: Some(answer.content),
                    citations: json!(answer.citations),
                    brand_mentioned: analysis.mentioned,
                    brand_position: i32::try_from(analysis.position).unwrap_or(i32::MAX),
                    brand_mention_count: i32::try_from(analysis.mention_count)
                        .unwrap_or(i32::MAX),
                    competitor_mentions: serde_json::to_value(&analysis.competitor_mentions)
                        .unwrap_or_else(|_| json!([])),
                    sentiment_score: analysis.sentiment,
                    response_time_ms: answer.response_time_ms.try_into().ok(),
                    error_message: None,
                }
            }
            Err(ProviderError::NoResult) => {
                outcome.no_result += 1;
                empty_result(report_id, prompt.id, kind, ProviderResultStatus::NoResult, None)
            }
            Err(e) => {
                outcome.errors += 1;
                tracing::warn!(
                    provider = %kind,
                    prompt_id = prompt.id,
                    error = %e,
                    "provider call failed, recording error row"
                );
                empty_result(
                    report_id,
                    prompt.id,
                    kind,
                    ProviderResultStatus::Error,
                    Some(e.to_string()),
                )
            }
        };

        upsert_prompt_result(pool, &result).await?;
    }

    let status = coarse_status(outcome);
    set_provider_status(pool, report_id, kind, status).await?;
    set_provider_counts(
        pool,
        report_id,
        kind,
        i32::try_from(outcome.attempted).unwrap_or(i32::MAX),
        i32::try_from(outcome.ok).unwrap_or(i32::MAX),
        i32::try_from(outcome.no_result).unwrap_or(i32::MAX),
    )
    .await?;

    tracing::info!(
        provider = %kind,
        report_id,
        attempted = outcome.attempted,
        ok = outcome.ok,
        no_result = outcome.no_result,
        errors = outcome.errors,
        status = %status,
        "provider pass finished"
    );

    Ok(outcome)
}

fn empty_result(
    report_id: i64,
    prompt_id: i64,
    kind: aeomon_core::ProviderKind,
    status: ProviderResultStatus,
    error_message: Option<String>,
) -> NewPromptResult {
    NewPromptResult {
        report_id,
        prompt_id,
        provider: kind,
        provider_status: status,
        answer_text: None,
        citations: json!([]),
        brand_mentioned: false,
        brand_position: -1,
        brand_mention_count: 0,
        competitor_mentions: json!([]),
        sentiment_score: 0.0,
        response_time_ms: None,
        error_message,
    }
}
