//! Database operations for the `daily_reports` table.
//!
//! The report row is created once per (brand, date) via an idempotent
//! lookup-or-insert and then mutated field-by-field as the pipeline runs:
//! each stage owns its own columns, and only the completion reconciler
//! writes `generated`/`status='completed'`/`completed_at`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use aeomon_core::{ProviderKind, ProviderStatus, UrlProcessingStatus};

use crate::DbError;

const REPORT_COLUMNS: &str = "id, public_id, brand_id, report_date, status, generated, \
     answer_llm_status, answer_llm_attempted, answer_llm_ok, answer_llm_no_result, \
     web_search_status, web_search_attempted, web_search_ok, web_search_no_result, \
     chat_scrape_status, chat_scrape_attempted, chat_scrape_ok, chat_scrape_no_result, \
     url_processing_status, urls_total, urls_extracted, urls_classified, \
     total_mentions, average_position, sentiment_positive, sentiment_neutral, \
     sentiment_negative, visibility_score, share_of_voice, \
     error_message, completed_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `daily_reports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyReportRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub report_date: NaiveDate,
    pub status: String,
    pub generated: bool,
    pub answer_llm_status: String,
    pub answer_llm_attempted: i32,
    pub answer_llm_ok: i32,
    pub answer_llm_no_result: i32,
    pub web_search_status: String,
    pub web_search_attempted: i32,
    pub web_search_ok: i32,
    pub web_search_no_result: i32,
    pub chat_scrape_status: String,
    pub chat_scrape_attempted: i32,
    pub chat_scrape_ok: i32,
    pub chat_scrape_no_result: i32,
    pub url_processing_status: String,
    pub urls_total: i32,
    pub urls_extracted: i32,
    pub urls_classified: i32,
    pub total_mentions: i32,
    pub average_position: Option<Decimal>,
    pub sentiment_positive: i32,
    pub sentiment_neutral: i32,
    pub sentiment_negative: i32,
    pub visibility_score: Option<Decimal>,
    pub share_of_voice: Option<Value>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyReportRow {
    /// The stored status for a provider pass, parsed; unknown strings read
    /// as `not_started` so a bad row degrades to "re-run the pass".
    #[must_use]
    pub fn provider_status(&self, kind: ProviderKind) -> ProviderStatus {
        let raw = match kind {
            ProviderKind::AnswerLlm => &self.answer_llm_status,
            ProviderKind::WebSearch => &self.web_search_status,
            ProviderKind::ChatScrape => &self.chat_scrape_status,
        };
        ProviderStatus::parse(raw).unwrap_or(ProviderStatus::NotStarted)
    }

    #[must_use]
    pub fn url_status(&self) -> UrlProcessingStatus {
        UrlProcessingStatus::parse(&self.url_processing_status)
            .unwrap_or(UrlProcessingStatus::NotStarted)
    }
}

/// Aggregated metrics written back onto a report row.
#[derive(Debug, Clone)]
pub struct ReportMetrics {
    pub total_mentions: i32,
    pub average_position: Option<Decimal>,
    pub sentiment_positive: i32,
    pub sentiment_neutral: i32,
    pub sentiment_negative: i32,
    pub visibility_score: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Looks up or creates the report row for `(brand_id, date)`.
///
/// The conflict update is a no-op touch of `updated_at` so the full row is
/// returned whether it was inserted or already existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn get_or_create_report(
    pool: &PgPool,
    brand_id: i64,
    date: NaiveDate,
) -> Result<DailyReportRow, DbError> {
    let sql = format!(
        "INSERT INTO daily_reports (public_id, brand_id, report_date) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (brand_id, report_date) DO UPDATE SET updated_at = NOW() \
         RETURNING {REPORT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, DailyReportRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(brand_id)
        .bind(date)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Fetches a report by internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, [`DbError::Sqlx`] on
/// query failure.
pub async fn get_report(pool: &PgPool, id: i64) -> Result<DailyReportRow, DbError> {
    let sql = format!("SELECT {REPORT_COLUMNS} FROM daily_reports WHERE id = $1");
    sqlx::query_as::<_, DailyReportRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Fetches a report by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, [`DbError::Sqlx`] on
/// query failure.
pub async fn get_report_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<DailyReportRow, DbError> {
    let sql = format!("SELECT {REPORT_COLUMNS} FROM daily_reports WHERE public_id = $1");
    sqlx::query_as::<_, DailyReportRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Lists recent reports, optionally filtered by brand, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reports(
    pool: &PgPool,
    brand_id: Option<i64>,
    limit: i64,
) -> Result<Vec<DailyReportRow>, DbError> {
    let rows = match brand_id {
        Some(id) => {
            let sql = format!(
                "SELECT {REPORT_COLUMNS} FROM daily_reports \
                 WHERE brand_id = $1 \
                 ORDER BY report_date DESC, id DESC LIMIT $2"
            );
            sqlx::query_as::<_, DailyReportRow>(&sql)
                .bind(id)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {REPORT_COLUMNS} FROM daily_reports \
                 ORDER BY report_date DESC, id DESC LIMIT $1"
            );
            sqlx::query_as::<_, DailyReportRow>(&sql)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

/// Sets the status column for one provider pass.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_provider_status(
    pool: &PgPool,
    report_id: i64,
    kind: ProviderKind,
    status: ProviderStatus,
) -> Result<(), DbError> {
    let sql = match kind {
        ProviderKind::AnswerLlm => {
            "UPDATE daily_reports SET answer_llm_status = $1, updated_at = NOW() WHERE id = $2"
        }
        ProviderKind::WebSearch => {
            "UPDATE daily_reports SET web_search_status = $1, updated_at = NOW() WHERE id = $2"
        }
        ProviderKind::ChatScrape => {
            "UPDATE daily_reports SET chat_scrape_status = $1, updated_at = NOW() WHERE id = $2"
        }
    };
    sqlx::query(sql)
        .bind(status.as_str())
        .bind(report_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Sets the attempted/ok/no-result counters for one provider pass.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_provider_counts(
    pool: &PgPool,
    report_id: i64,
    kind: ProviderKind,
    attempted: i32,
    ok: i32,
    no_result: i32,
) -> Result<(), DbError> {
    let sql = match kind {
        ProviderKind::AnswerLlm => {
            "UPDATE daily_reports SET answer_llm_attempted = $1, answer_llm_ok = $2, \
             answer_llm_no_result = $3, updated_at = NOW() WHERE id = $4"
        }
        ProviderKind::WebSearch => {
            "UPDATE daily_reports SET web_search_attempted = $1, web_search_ok = $2, \
             web_search_no_result = $3, updated_at = NOW() WHERE id = $4"
        }
        ProviderKind::ChatScrape => {
            "UPDATE daily_reports SET chat_scrape_attempted = $1, chat_scrape_ok = $2, \
             chat_scrape_no_result = $3, updated_at = NOW() WHERE id = $4"
        }
    };
    sqlx::query(sql)
        .bind(attempted)
        .bind(ok)
        .bind(no_result)
        .bind(report_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Sets the URL-processing status and counters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_url_processing(
    pool: &PgPool,
    report_id: i64,
    status: UrlProcessingStatus,
    urls_total: i32,
    urls_extracted: i32,
    urls_classified: i32,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE daily_reports \
         SET url_processing_status = $1, urls_total = $2, urls_extracted = $3, \
             urls_classified = $4, updated_at = NOW() \
         WHERE id = $5",
    )
    .bind(status.as_str())
    .bind(urls_total)
    .bind(urls_extracted)
    .bind(urls_classified)
    .bind(report_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Writes the aggregated mention/rank/sentiment/visibility metrics.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_metrics(
    pool: &PgPool,
    report_id: i64,
    metrics: &ReportMetrics,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE daily_reports \
         SET total_mentions = $1, average_position = $2, sentiment_positive = $3, \
             sentiment_neutral = $4, sentiment_negative = $5, visibility_score = $6, \
             updated_at = NOW() \
         WHERE id = $7",
    )
    .bind(metrics.total_mentions)
    .bind(metrics.average_position)
    .bind(metrics.sentiment_positive)
    .bind(metrics.sentiment_neutral)
    .bind(metrics.sentiment_negative)
    .bind(metrics.visibility_score)
    .bind(report_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stores the share-of-voice summary JSON.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_share_of_voice(
    pool: &PgPool,
    report_id: i64,
    summary: &Value,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE daily_reports SET share_of_voice = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(summary)
    .bind(report_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Marks a report complete: `generated = true`, `status = 'completed'`,
/// `completed_at = NOW()`. Reconciler-only.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_completed(pool: &PgPool, report_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE daily_reports \
         SET generated = true, status = 'completed', completed_at = NOW(), \
             error_message = NULL, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(report_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Marks a report as still running: `generated = false`, `status = 'running'`,
/// `completed_at = NULL`. Reconciler-only.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_running(pool: &PgPool, report_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE daily_reports \
         SET generated = false, status = 'running', completed_at = NULL, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(report_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Marks a report failed with an error message.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_failed(pool: &PgPool, report_id: i64, error_message: &str) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE daily_reports \
         SET generated = false, status = 'failed', error_message = $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(error_message)
    .bind(report_id)
    .execute(pool)
    .await?;

    Ok(())
}
