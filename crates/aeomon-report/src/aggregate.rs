//! Aggregation writers: rank/sentiment metrics, citation shares, share of
//! voice, and the visibility score for one report.
//!
//! The math lives in `aeomon-analysis`; this module reads the stored prompt
//! results, feeds the pure functions, and writes the outputs back onto the
//! report row and its snapshot tables.

use rust_decimal::Decimal;
use sqlx::PgPool;

use aeomon_analysis::{
    aggregate_rank_sentiment, build_sov_corpus, categorize_entity, compute_citation_shares,
    merge_entities, visibility_score, CompetitorMention, ResultMentions, ResultVisibility,
    SovEntity, SovSummary,
};
use aeomon_core::ProviderResultStatus;
use aeomon_db::{
    list_results_for_report, replace_report_shares, set_metrics, set_share_of_voice,
    NewCitationShare, PromptResultRow, ReportMetrics,
};
use aeomon_providers::CompletionsClient;

use crate::error::ReportError;

/// Runs all aggregators for one report.
///
/// # Errors
///
/// Returns [`ReportError::Db`] on database failures. A failed share-of-voice
/// extraction call is logged and skipped: it degrades the report, it does
/// not fail it.
pub async fn run_aggregation(
    pool: &PgPool,
    completions: &CompletionsClient,
    report_id: i64,
    brand_name: &str,
    competitors: &[String],
) -> Result<(), ReportError> {
    let results = list_results_for_report(pool, report_id).await?;
    let ok_rows: Vec<&PromptResultRow> = results
        .iter()
        .filter(|r| r.provider_status == ProviderResultStatus::Ok.as_str())
        .collect();

    // Rank, sentiment buckets, and the visibility score.
    let mentions: Vec<ResultMentions> = ok_rows.iter().map(|r| result_mentions(r)).collect();
    let summary = aggregate_rank_sentiment(&mentions);

    let visibility: Vec<ResultVisibility> = ok_rows.iter().map(|r| result_visibility(r)).collect();
    let breakdown = visibility_score(&visibility);

    let metrics = ReportMetrics {
        total_mentions: i32::try_from(summary.total_mentions).unwrap_or(i32::MAX),
        average_position: summary
            .average_position
            .and_then(Decimal::from_f64_retain)
            .map(|d| d.round_dp(3)),
        sentiment_positive: i32::try_from(summary.sentiment.positive).unwrap_or(i32::MAX),
        sentiment_neutral: i32::try_from(summary.sentiment.neutral).unwrap_or(i32::MAX),
        sentiment_negative: i32::try_from(summary.sentiment.negative).unwrap_or(i32::MAX),
        visibility_score: if ok_rows.is_empty() {
            None
        } else {
            Decimal::from_f64_retain(breakdown.score).map(|d| d.round_dp(2))
        },
    };
    set_metrics(pool, report_id, &metrics).await?;

    // Citation share by domain, replaced wholesale.
    let citation_urls: Vec<String> = ok_rows.iter().flat_map(|r| r.citation_urls()).collect();
    let shares: Vec<NewCitationShare> = compute_citation_shares(&citation_urls)
        .into_iter()
        .map(|s| NewCitationShare {
            domain: s.domain,
            citation_count: i32::try_from(s.citation_count).unwrap_or(i32::MAX),
            share_pct: s.share_pct,
            rank: i32::try_from(s.rank).unwrap_or(i32::MAX),
        })
        .collect();
    replace_report_shares(pool, report_id, &shares).await?;

    // Share of voice via one extraction call over the answer corpus.
    let texts: Vec<String> = ok_rows
        .iter()
        .filter_map(|r| r.answer_text.clone())
        .collect();
    let corpus = build_sov_corpus(&texts);
    if !corpus.is_empty() {
        match extract_sov(completions, &corpus, brand_name, competitors).await {
            Ok(summary) => match serde_json::to_value(&summary) {
                Ok(value) => set_share_of_voice(pool, report_id, &value).await?,
                Err(e) => {
                    tracing::warn!(report_id, error = %e, "share-of-voice summary not serializable");
                }
            },
            Err(e) => {
                tracing::warn!(report_id, error = %e, "share-of-voice extraction failed, skipping");
            }
        }
    }

    Ok(())
}

fn result_mentions(row: &PromptResultRow) -> ResultMentions {
    ResultMentions {
        brand_mentioned: row.brand_mentioned,
        brand_position: i64::from(row.brand_position),
        sentiment: row.sentiment_score,
        competitor_positions: competitor_mentions(row)
            .iter()
            .map(|c| i64::try_from(c.first_position).unwrap_or(i64::MAX))
            .collect(),
    }
}

fn result_visibility(row: &PromptResultRow) -> ResultVisibility {
    let competitors = competitor_mentions(row);
    ResultVisibility {
        brand_mentioned: row.brand_mentioned,
        brand_position: i64::from(row.brand_position),
        brand_mention_count: u32::try_from(row.brand_mention_count).unwrap_or(0),
        earliest_competitor_position: competitors
            .iter()
            .map(|c| i64::try_from(c.first_position).unwrap_or(i64::MAX))
            .min(),
        competitor_mention_count: competitors
            .iter()
            .map(|c| u32::try_from(c.count).unwrap_or(0))
            .sum(),
    }
}

fn competitor_mentions(row: &PromptResultRow) -> Vec<CompetitorMention> {
    serde_json::from_value(row.competitor_mentions.clone()).unwrap_or_default()
}

async fn extract_sov(
    completions: &CompletionsClient,
    corpus: &str,
    brand_name: &str,
    competitors: &[String],
) -> Result<SovSummary, aeomon_providers::ProviderError> {
    let system = "You extract company and product names from AI-generated answer text. \
                  Answer with JSON only: {\"entities\": [{\"name\": <string>, \
                  \"mentions\": <number of distinct responses naming it>}]}.";
    let value = completions.complete_json(system, corpus).await?;

    let raw: Vec<(String, u32)> = value
        .get("entities")
        .and_then(serde_json::Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    let name = e.get("name")?.as_str()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let mentions = u32::try_from(e.get("mentions")?.as_u64()?).ok()?;
                    Some((name.to_owned(), mentions))
                })
                .collect()
        })
        .unwrap_or_default();

    let entities: Vec<SovEntity> = raw
        .into_iter()
        .map(|(name, mentions)| {
            let category = categorize_entity(&name, brand_name, competitors);
            SovEntity {
                name,
                mentions,
                category,
            }
        })
        .collect();
    let entities = merge_entities(entities);
    let total_mentions = entities.iter().map(|e| e.mentions).sum();

    Ok(SovSummary {
        entities,
        total_mentions,
    })
}
