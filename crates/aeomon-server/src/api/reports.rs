use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aeomon_core::ProviderKind;
use aeomon_db::{BrandRow, DailyReportRow, DbError};
use aeomon_report::{ReportError, ReportRunSummary};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct GenerateRequest {
    pub brand_slug: String,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub from_cron: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportRunData {
    report_id: Uuid,
    brand_slug: String,
    generated: bool,
    answer_llm: String,
    web_search: String,
    chat_scrape: String,
    is_complete: bool,
}

impl From<ReportRunSummary> for ReportRunData {
    fn from(summary: ReportRunSummary) -> Self {
        Self {
            report_id: summary.public_id,
            brand_slug: summary.brand_slug,
            generated: summary.generated,
            answer_llm: summary.answer_llm.to_string(),
            web_search: summary.web_search.to_string(),
            chat_scrape: summary.chat_scrape.to_string(),
            is_complete: summary.is_complete,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ReportsQuery {
    pub brand_slug: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportItem {
    report_id: Uuid,
    report_date: NaiveDate,
    status: String,
    generated: bool,
    answer_llm_status: String,
    web_search_status: String,
    chat_scrape_status: String,
    url_processing_status: String,
    urls_total: i32,
    urls_extracted: i32,
    urls_classified: i32,
    total_mentions: i32,
    average_position: Option<Decimal>,
    sentiment_positive: i32,
    sentiment_neutral: i32,
    sentiment_negative: i32,
    visibility_score: Option<Decimal>,
    share_of_voice: Option<serde_json::Value>,
    error_message: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<DailyReportRow> for ReportItem {
    fn from(row: DailyReportRow) -> Self {
        Self {
            report_id: row.public_id,
            report_date: row.report_date,
            status: row.status,
            generated: row.generated,
            answer_llm_status: row.answer_llm_status,
            web_search_status: row.web_search_status,
            chat_scrape_status: row.chat_scrape_status,
            url_processing_status: row.url_processing_status,
            urls_total: row.urls_total,
            urls_extracted: row.urls_extracted,
            urls_classified: row.urls_classified,
            total_mentions: row.total_mentions,
            average_position: row.average_position,
            sentiment_positive: row.sentiment_positive,
            sentiment_neutral: row.sentiment_neutral,
            sentiment_negative: row.sentiment_negative,
            visibility_score: row.visibility_score,
            share_of_voice: row.share_of_voice,
            error_message: row.error_message,
            completed_at: row.completed_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CitationShareItem {
    domain: String,
    citation_count: i32,
    share_pct: Decimal,
    rank: i32,
}

/// Triggers (or resumes) today's report for one brand.
///
/// Manual runs are raced against the configured timeout; on timeout the
/// partial progress stands and the current report state is returned, so a
/// later trigger or the nightly job resumes where this one stopped.
pub(super) async fn generate_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<ReportRunData>>, ApiError> {
    if body.brand_slug.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "brand_slug is required",
        ));
    }

    let brand = aeomon_db::get_brand_by_slug(&state.pool, &body.brand_slug)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "bad_request", "unknown brand slug"))?;

    let date = Utc::now().date_naive();
    tracing::info!(
        brand = %brand.slug,
        manual = body.manual,
        from_cron = body.from_cron,
        "report generation triggered"
    );

    let summary = if body.manual {
        let run = state.pipeline.generate_daily_report(&brand, date);
        match tokio::time::timeout(state.manual_timeout, run).await {
            Ok(result) => result.map_err(|e| map_report_error(req_id.0.clone(), &e))?,
            Err(_) => {
                tracing::warn!(
                    brand = %brand.slug,
                    timeout_secs = state.manual_timeout.as_secs(),
                    "manual report run timed out; partial progress kept"
                );
                current_run_summary(&state.pool, &brand, date)
                    .await
                    .map_err(|e| map_db_error(req_id.0.clone(), &e))?
            }
        }
    } else {
        state
            .pipeline
            .generate_daily_report(&brand, date)
            .await
            .map_err(|e| map_report_error(req_id.0.clone(), &e))?
    };

    Ok(Json(ApiResponse {
        data: ReportRunData::from(summary),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_reports(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<ApiResponse<Vec<ReportItem>>>, ApiError> {
    let brand_id = match query.brand_slug.as_deref() {
        Some(slug) => {
            let brand = aeomon_db::get_brand_by_slug(&state.pool, slug)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
            match brand {
                Some(brand) => Some(brand.id),
                // Unknown slug filters to nothing rather than erroring.
                None => {
                    return Ok(Json(ApiResponse {
                        data: Vec::new(),
                        meta: ResponseMeta::new(req_id.0),
                    }))
                }
            }
        }
        None => None,
    };

    let rows = aeomon_db::list_reports(&state.pool, brand_id, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ReportItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportItem>>, ApiError> {
    let row = aeomon_db::get_report_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ReportItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_report_citations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CitationShareItem>>>, ApiError> {
    let report = aeomon_db::get_report_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let shares = aeomon_db::list_shares_for_report(&state.pool, report.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = shares
        .into_iter()
        .map(|share| CitationShareItem {
            domain: share.domain,
            citation_count: share.citation_count,
            share_pct: share.share_pct,
            rank: share.rank,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Reads the current report row for `(brand, date)` as a run summary,
/// without running any pipeline stage.
async fn current_run_summary(
    pool: &sqlx::PgPool,
    brand: &BrandRow,
    date: NaiveDate,
) -> Result<ReportRunSummary, DbError> {
    let row = aeomon_db::get_or_create_report(pool, brand.id, date).await?;
    Ok(ReportRunSummary {
        report_id: row.id,
        public_id: row.public_id,
        brand_slug: brand.slug.clone(),
        generated: row.generated,
        answer_llm: row.provider_status(ProviderKind::AnswerLlm),
        web_search: row.provider_status(ProviderKind::WebSearch),
        chat_scrape: row.provider_status(ProviderKind::ChatScrape),
        is_complete: row.generated,
    })
}

fn map_report_error(request_id: String, error: &ReportError) -> ApiError {
    tracing::error!(error = %error, "report generation failed");
    ApiError::new(request_id, "internal_error", "report generation failed")
}
