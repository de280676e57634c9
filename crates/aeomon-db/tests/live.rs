//! Live integration tests for aeomon-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/aeomon-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use aeomon_core::{
    ContentCategory, ProviderKind, ProviderResultStatus, ProviderStatus, UrlProcessingStatus,
};
use aeomon_db::{
    get_or_create_report, get_report, list_active_brands, list_active_prompts, list_competitors,
    list_reports, list_results_for_report, list_shares_for_report, mark_completed, mark_failed,
    record_extraction_failure, record_extraction_success, replace_report_shares,
    reset_capped_urls, select_pending, set_provider_status, set_url_processing,
    upsert_brand, upsert_competitor, upsert_inventory, upsert_prompt, upsert_prompt_result,
    NewCitationShare, NewPromptResult, MAX_EXTRACTION_RETRIES,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_brand(pool: &sqlx::PgPool, name: &str, slug: &str) -> i64 {
    upsert_brand(pool, name, slug, Some("example.com"))
        .await
        .unwrap_or_else(|e| panic!("upsert_brand failed for slug '{slug}': {e}"))
}

async fn seed_prompt(pool: &sqlx::PgPool, brand_id: i64, text: &str) -> i64 {
    upsert_prompt(pool, brand_id, text)
        .await
        .expect("upsert_prompt failed");
    let prompts = list_active_prompts(pool, brand_id)
        .await
        .expect("list_active_prompts failed");
    prompts
        .iter()
        .find(|p| p.text == text)
        .expect("seeded prompt missing")
        .id
}

fn report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 26).expect("valid date")
}

fn make_result(report_id: i64, prompt_id: i64, answer: &str) -> NewPromptResult {
    NewPromptResult {
        report_id,
        prompt_id,
        provider: ProviderKind::AnswerLlm,
        provider_status: ProviderResultStatus::Ok,
        answer_text: Some(answer.to_string()),
        citations: json!(["https://example.com/review"]),
        brand_mentioned: true,
        brand_position: 0,
        brand_mention_count: 1,
        competitor_mentions: json!([]),
        sentiment_score: 0.3,
        response_time_ms: Some(850),
        error_message: None,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Brand catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn brand_upsert_is_idempotent(pool: sqlx::PgPool) {
    let first = seed_brand(&pool, "Acme", "acme").await;
    let second = seed_brand(&pool, "Acme Inc", "acme").await;

    assert_eq!(first, second, "same slug must resolve to the same row");

    let brands = list_active_brands(&pool).await.expect("list failed");
    assert_eq!(brands.len(), 1);
    assert_eq!(brands[0].name, "Acme Inc", "conflict updates the name");
}

#[sqlx::test(migrations = "../../migrations")]
async fn competitor_and_prompt_upserts_dedupe(pool: sqlx::PgPool) {
    let brand_id = seed_brand(&pool, "Acme", "acme").await;

    upsert_competitor(&pool, brand_id, "BetaCorp", None)
        .await
        .expect("upsert_competitor failed");
    upsert_competitor(&pool, brand_id, "BetaCorp", Some("betacorp.io"))
        .await
        .expect("repeat upsert_competitor failed");

    let competitors = list_competitors(&pool, brand_id).await.expect("list failed");
    assert_eq!(competitors.len(), 1);
    assert_eq!(competitors[0].domain.as_deref(), Some("betacorp.io"));

    seed_prompt(&pool, brand_id, "best widget vendor").await;
    seed_prompt(&pool, brand_id, "best widget vendor").await;

    let prompts = list_active_prompts(&pool, brand_id).await.expect("list failed");
    assert_eq!(prompts.len(), 1);
}

// ---------------------------------------------------------------------------
// Section 2: Daily report lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn report_get_or_create_is_idempotent(pool: sqlx::PgPool) {
    let brand_id = seed_brand(&pool, "Acme", "acme").await;

    let first = get_or_create_report(&pool, brand_id, report_date())
        .await
        .expect("first get_or_create failed");
    let second = get_or_create_report(&pool, brand_id, report_date())
        .await
        .expect("second get_or_create failed");

    assert_eq!(first.id, second.id);
    assert_eq!(first.public_id, second.public_id);
    assert_eq!(second.status, "running");
    assert!(!second.generated);
    assert_eq!(
        second.provider_status(ProviderKind::AnswerLlm),
        ProviderStatus::NotStarted
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn provider_status_updates_only_their_column(pool: sqlx::PgPool) {
    let brand_id = seed_brand(&pool, "Acme", "acme").await;
    let report = get_or_create_report(&pool, brand_id, report_date())
        .await
        .expect("get_or_create failed");

    set_provider_status(&pool, report.id, ProviderKind::AnswerLlm, ProviderStatus::Complete)
        .await
        .expect("set answer_llm status failed");
    set_provider_status(&pool, report.id, ProviderKind::WebSearch, ProviderStatus::Running)
        .await
        .expect("set web_search status failed");

    let fetched = get_report(&pool, report.id).await.expect("get_report failed");
    assert_eq!(
        fetched.provider_status(ProviderKind::AnswerLlm),
        ProviderStatus::Complete
    );
    assert_eq!(
        fetched.provider_status(ProviderKind::WebSearch),
        ProviderStatus::Running
    );
    assert_eq!(
        fetched.provider_status(ProviderKind::ChatScrape),
        ProviderStatus::NotStarted
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn completion_markers_set_and_clear_state(pool: sqlx::PgPool) {
    let brand_id = seed_brand(&pool, "Acme", "acme").await;
    let report = get_or_create_report(&pool, brand_id, report_date())
        .await
        .expect("get_or_create failed");

    mark_failed(&pool, report.id, "provider exploded")
        .await
        .expect("mark_failed failed");
    let failed = get_report(&pool, report.id).await.expect("get failed");
    assert_eq!(failed.status, "failed");
    assert_eq!(failed.error_message.as_deref(), Some("provider exploded"));

    mark_completed(&pool, report.id).await.expect("mark_completed failed");
    let done = get_report(&pool, report.id).await.expect("get failed");
    assert_eq!(done.status, "completed");
    assert!(done.generated);
    assert!(done.completed_at.is_some());
    assert!(done.error_message.is_none(), "completion clears the error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_reports_filters_by_brand(pool: sqlx::PgPool) {
    let acme = seed_brand(&pool, "Acme", "acme").await;
    let beta = seed_brand(&pool, "BetaCorp", "betacorp").await;

    get_or_create_report(&pool, acme, report_date()).await.expect("acme report");
    get_or_create_report(&pool, beta, report_date()).await.expect("beta report");

    let all = list_reports(&pool, None, 10).await.expect("list all failed");
    assert_eq!(all.len(), 2);

    let only_acme = list_reports(&pool, Some(acme), 10).await.expect("list acme failed");
    assert_eq!(only_acme.len(), 1);
    assert_eq!(only_acme[0].brand_id, acme);
}

// ---------------------------------------------------------------------------
// Section 3: Prompt results
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn prompt_result_upsert_overwrites_same_slot(pool: sqlx::PgPool) {
    let brand_id = seed_brand(&pool, "Acme", "acme").await;
    let prompt_id = seed_prompt(&pool, brand_id, "best widget vendor").await;
    let report = get_or_create_report(&pool, brand_id, report_date())
        .await
        .expect("get_or_create failed");

    let first_id = upsert_prompt_result(&pool, &make_result(report.id, prompt_id, "old answer"))
        .await
        .expect("first upsert failed");
    let second_id = upsert_prompt_result(&pool, &make_result(report.id, prompt_id, "new answer"))
        .await
        .expect("second upsert failed");

    assert_eq!(first_id, second_id, "rerun must overwrite, not append");

    let results = list_results_for_report(&pool, report.id)
        .await
        .expect("list failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].answer_text.as_deref(), Some("new answer"));
    assert_eq!(results[0].citation_urls(), vec!["https://example.com/review"]);
}

// ---------------------------------------------------------------------------
// Section 4: URL inventory
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn inventory_dedupes_url_variants(pool: sqlx::PgPool) {
    let a = upsert_inventory(&pool, "https://Example.com/review#top")
        .await
        .expect("first upsert failed");
    let b = upsert_inventory(&pool, "https://example.com/review")
        .await
        .expect("second upsert failed");

    assert_eq!(a.id, b.id, "URL variants must share one inventory row");
    assert_eq!(b.domain, "example.com");
    assert!(!b.content_extracted);
}

#[sqlx::test(migrations = "../../migrations")]
async fn retry_cap_excludes_url_until_reset(pool: sqlx::PgPool) {
    let row = upsert_inventory(&pool, "https://example.com/flaky")
        .await
        .expect("upsert failed");
    let keys = vec![row.url_key.clone()];

    for _ in 0..MAX_EXTRACTION_RETRIES {
        record_extraction_failure(&pool, &row.url_key, "timeout")
            .await
            .expect("record failure failed");
    }

    let pending = select_pending(&pool, &keys).await.expect("select failed");
    assert!(pending.is_empty(), "capped URL must not be retried");

    let reset = reset_capped_urls(&pool).await.expect("reset failed");
    assert_eq!(reset, 1);

    let pending = select_pending(&pool, &keys).await.expect("select failed");
    assert_eq!(pending.len(), 1, "reset makes the URL eligible again");
}

#[sqlx::test(migrations = "../../migrations")]
async fn extraction_success_removes_from_pending(pool: sqlx::PgPool) {
    let row = upsert_inventory(&pool, "https://example.com/good")
        .await
        .expect("upsert failed");

    record_extraction_success(&pool, &row.url_key)
        .await
        .expect("record success failed");

    let pending = select_pending(&pool, &[row.url_key.clone()])
        .await
        .expect("select failed");
    assert!(pending.is_empty());

    let unclassified = aeomon_db::select_unclassified(&pool, &[row.url_key.clone()])
        .await
        .expect("select_unclassified failed");
    assert_eq!(unclassified.len(), 1, "extracted but unclassified");

    aeomon_db::upsert_content_facts(
        &pool,
        &row.url_key,
        Some("A good page"),
        Some("body text"),
        ContentCategory::BlogPost,
        Some(0.9),
        "heuristic-v1",
    )
    .await
    .expect("upsert facts failed");

    let unclassified = aeomon_db::select_unclassified(&pool, &[row.url_key])
        .await
        .expect("select_unclassified failed");
    assert!(unclassified.is_empty());
}

// ---------------------------------------------------------------------------
// Section 5: Citation shares and URL counters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn citation_shares_replace_wholesale(pool: sqlx::PgPool) {
    let brand_id = seed_brand(&pool, "Acme", "acme").await;
    let report = get_or_create_report(&pool, brand_id, report_date())
        .await
        .expect("get_or_create failed");

    let first = vec![NewCitationShare {
        domain: "old.example".to_string(),
        citation_count: 5,
        share_pct: Decimal::new(10000, 2),
        rank: 1,
    }];
    replace_report_shares(&pool, report.id, &first)
        .await
        .expect("first replace failed");

    let second = vec![
        NewCitationShare {
            domain: "a.example".to_string(),
            citation_count: 3,
            share_pct: Decimal::new(6000, 2),
            rank: 1,
        },
        NewCitationShare {
            domain: "b.example".to_string(),
            citation_count: 2,
            share_pct: Decimal::new(4000, 2),
            rank: 2,
        },
    ];
    replace_report_shares(&pool, report.id, &second)
        .await
        .expect("second replace failed");

    let shares = list_shares_for_report(&pool, report.id)
        .await
        .expect("list failed");
    assert_eq!(shares.len(), 2, "old snapshot must be gone");
    assert_eq!(shares[0].domain, "a.example");
    assert_eq!(shares[0].rank, 1);
    assert_eq!(shares[1].domain, "b.example");
}

#[sqlx::test(migrations = "../../migrations")]
async fn url_processing_counters_round_trip(pool: sqlx::PgPool) {
    let brand_id = seed_brand(&pool, "Acme", "acme").await;
    let report = get_or_create_report(&pool, brand_id, report_date())
        .await
        .expect("get_or_create failed");

    set_url_processing(&pool, report.id, UrlProcessingStatus::Complete, 12, 10, 9)
        .await
        .expect("set_url_processing failed");

    let fetched = get_report(&pool, report.id).await.expect("get failed");
    assert_eq!(fetched.url_status(), UrlProcessingStatus::Complete);
    assert_eq!(fetched.urls_total, 12);
    assert_eq!(fetched.urls_extracted, 10);
    assert_eq!(fetched.urls_classified, 9);
}
