//! Database operations for the `prompt_results` table.
//!
//! Every provider pass writes through [`upsert_prompt_result`]; the unique
//! key on `(report_id, prompt_id, provider)` makes a rerun overwrite the
//! earlier attempt for the same slot instead of appending.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use aeomon_core::{ProviderKind, ProviderResultStatus};

use crate::DbError;

const RESULT_COLUMNS: &str = "id, report_id, prompt_id, provider, provider_status, answer_text, \
     citations, brand_mentioned, brand_position, brand_mention_count, competitor_mentions, \
     sentiment_score, response_time_ms, error_message, created_at, updated_at";

/// A row from the `prompt_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PromptResultRow {
    pub id: i64,
    pub report_id: i64,
    pub prompt_id: i64,
    pub provider: String,
    pub provider_status: String,
    pub answer_text: Option<String>,
    pub citations: Value,
    pub brand_mentioned: bool,
    pub brand_position: i32,
    pub brand_mention_count: i32,
    pub competitor_mentions: Value,
    pub sentiment_score: f64,
    pub response_time_ms: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromptResultRow {
    /// The stored citation URLs as plain strings, skipping malformed entries.
    #[must_use]
    pub fn citation_urls(&self) -> Vec<String> {
        self.citations
            .as_array()
            .map(|urls| {
                urls.iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A prompt result to be written for one (report, prompt, provider) slot.
#[derive(Debug, Clone)]
pub struct NewPromptResult {
    pub report_id: i64,
    pub prompt_id: i64,
    pub provider: ProviderKind,
    pub provider_status: ProviderResultStatus,
    pub answer_text: Option<String>,
    pub citations: Value,
    pub brand_mentioned: bool,
    pub brand_position: i32,
    pub brand_mention_count: i32,
    pub competitor_mentions: Value,
    pub sentiment_score: f64,
    pub response_time_ms: Option<i64>,
    pub error_message: Option<String>,
}

/// Inserts or overwrites the result for one (report, prompt, provider) slot.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_prompt_result(pool: &PgPool, result: &NewPromptResult) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO prompt_results \
             (report_id, prompt_id, provider, provider_status, answer_text, citations, \
              brand_mentioned, brand_position, brand_mention_count, competitor_mentions, \
              sentiment_score, response_time_ms, error_message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         ON CONFLICT (report_id, prompt_id, provider) DO UPDATE SET \
             provider_status = EXCLUDED.provider_status, \
             answer_text = EXCLUDED.answer_text, \
             citations = EXCLUDED.citations, \
             brand_mentioned = EXCLUDED.brand_mentioned, \
             brand_position = EXCLUDED.brand_position, \
             brand_mention_count = EXCLUDED.brand_mention_count, \
             competitor_mentions = EXCLUDED.competitor_mentions, \
             sentiment_score = EXCLUDED.sentiment_score, \
             response_time_ms = EXCLUDED.response_time_ms, \
             error_message = EXCLUDED.error_message, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(result.report_id)
    .bind(result.prompt_id)
    .bind(result.provider.as_str())
    .bind(result.provider_status.as_str())
    .bind(result.answer_text.as_deref())
    .bind(&result.citations)
    .bind(result.brand_mentioned)
    .bind(result.brand_position)
    .bind(result.brand_mention_count)
    .bind(&result.competitor_mentions)
    .bind(result.sentiment_score)
    .bind(result.response_time_ms)
    .bind(result.error_message.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns all results for a report, ordered by prompt then provider.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_results_for_report(
    pool: &PgPool,
    report_id: i64,
) -> Result<Vec<PromptResultRow>, DbError> {
    let sql = format!(
        "SELECT {RESULT_COLUMNS} FROM prompt_results \
         WHERE report_id = $1 \
         ORDER BY prompt_id, provider"
    );
    let rows = sqlx::query_as::<_, PromptResultRow>(&sql)
        .bind(report_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Counts the stored results for a report, optionally for one provider.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_results_for_report(
    pool: &PgPool,
    report_id: i64,
    provider: Option<ProviderKind>,
) -> Result<i64, DbError> {
    let count: i64 = match provider {
        Some(kind) => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM prompt_results WHERE report_id = $1 AND provider = $2",
            )
            .bind(report_id)
            .bind(kind.as_str())
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM prompt_results WHERE report_id = $1")
                .bind(report_id)
                .fetch_one(pool)
                .await?
        }
    };

    Ok(count)
}
