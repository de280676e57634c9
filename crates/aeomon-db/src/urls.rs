//! Citation-URL inventory and extracted content facts.
//!
//! Inventory rows are keyed by a SHA-256 hash of the normalized URL, so
//! the same page cited under cosmetic URL variants lands on one row and
//! extraction work is shared across reports and brands.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use aeomon_core::ContentCategory;

use crate::DbError;

/// Automatic extraction stops for a URL after this many failed attempts.
/// [`reset_capped_urls`] clears the counter for a manual backfill.
pub const MAX_EXTRACTION_RETRIES: i32 = 3;

const INVENTORY_COLUMNS: &str = "id, url_key, url, domain, content_extracted, retry_count, \
     last_error, first_seen_at, last_attempt_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `url_inventory` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UrlInventoryRow {
    pub id: i64,
    pub url_key: String,
    pub url: String,
    pub domain: String,
    pub content_extracted: bool,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// A row from the `url_content_facts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UrlContentFactsRow {
    pub id: i64,
    pub url_key: String,
    pub title: Option<String>,
    pub extracted_text: Option<String>,
    pub category: String,
    pub classifier_confidence: Option<f64>,
    pub classifier_version: String,
    pub classified_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// URL normalization
// ---------------------------------------------------------------------------

/// Normalizes a URL for deduplication: trims whitespace, lowercases the
/// scheme and host, and drops the fragment. The path, query, and their
/// case are preserved since they can be significant.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);

    let Some((scheme, rest)) = without_fragment.split_once("://") else {
        return without_fragment.to_owned();
    };
    let (host, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let path = path.trim_end_matches('/');

    format!("{}://{}{}", scheme.to_lowercase(), host.to_lowercase(), path)
}

/// The stable inventory key for a URL: SHA-256 of the normalized form,
/// hex-encoded.
#[must_use]
pub fn url_key(url: &str) -> String {
    format!("{:x}", Sha256::digest(normalize_url(url).as_bytes()))
}

/// The bare registrable host of a URL: scheme, credentials, port, and a
/// leading `www.` stripped, lowercased.
fn domain_of(url: &str) -> String {
    let trimmed = url.trim();
    let rest = trimmed.split("://").nth(1).unwrap_or(trimmed);
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(rest);
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    host.trim_start_matches("www.").to_lowercase()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Registers a URL in the inventory, returning the (existing or new) row.
///
/// The conflict arm is a no-op touch so the full row comes back either way;
/// extraction state on an existing row is never reset here.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_inventory(pool: &PgPool, url: &str) -> Result<UrlInventoryRow, DbError> {
    let normalized = normalize_url(url);
    let key = url_key(url);
    let domain = domain_of(&normalized);

    let sql = format!(
        "INSERT INTO url_inventory (url_key, url, domain) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (url_key) DO UPDATE SET url = url_inventory.url \
         RETURNING {INVENTORY_COLUMNS}"
    );
    let row = sqlx::query_as::<_, UrlInventoryRow>(&sql)
        .bind(&key)
        .bind(&normalized)
        .bind(&domain)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Fetches an inventory row by key, or `None` if the URL is unknown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_inventory(pool: &PgPool, key: &str) -> Result<Option<UrlInventoryRow>, DbError> {
    let sql = format!("SELECT {INVENTORY_COLUMNS} FROM url_inventory WHERE url_key = $1");
    let row = sqlx::query_as::<_, UrlInventoryRow>(&sql)
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// From the given keys, returns the rows still eligible for extraction:
/// not yet extracted and under the retry cap.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_pending(
    pool: &PgPool,
    keys: &[String],
) -> Result<Vec<UrlInventoryRow>, DbError> {
    let sql = format!(
        "SELECT {INVENTORY_COLUMNS} FROM url_inventory \
         WHERE url_key = ANY($1) \
           AND content_extracted = false \
           AND retry_count < $2 \
         ORDER BY first_seen_at"
    );
    let rows = sqlx::query_as::<_, UrlInventoryRow>(&sql)
        .bind(keys)
        .bind(MAX_EXTRACTION_RETRIES)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the oldest rows still eligible for extraction across the whole
/// inventory, regardless of report. Used by the manual backfill path.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_backfill(pool: &PgPool, limit: i64) -> Result<Vec<UrlInventoryRow>, DbError> {
    let sql = format!(
        "SELECT {INVENTORY_COLUMNS} FROM url_inventory \
         WHERE content_extracted = false \
           AND retry_count < $1 \
         ORDER BY first_seen_at \
         LIMIT $2"
    );
    let rows = sqlx::query_as::<_, UrlInventoryRow>(&sql)
        .bind(MAX_EXTRACTION_RETRIES)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns extracted rows with no content-facts row, across the whole
/// inventory. Used by the manual backfill path.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_unclassified_backlog(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<UrlInventoryRow>, DbError> {
    let rows = sqlx::query_as::<_, UrlInventoryRow>(
        "SELECT i.id, i.url_key, i.url, i.domain, i.content_extracted, i.retry_count, \
                i.last_error, i.first_seen_at, i.last_attempt_at \
         FROM url_inventory i \
         WHERE i.content_extracted = true \
           AND NOT EXISTS (SELECT 1 FROM url_content_facts f WHERE f.url_key = i.url_key) \
         ORDER BY i.first_seen_at \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// From the given keys, returns the rows that are extracted but have no
/// content-facts row yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_unclassified(
    pool: &PgPool,
    keys: &[String],
) -> Result<Vec<UrlInventoryRow>, DbError> {
    let rows = sqlx::query_as::<_, UrlInventoryRow>(
        "SELECT i.id, i.url_key, i.url, i.domain, i.content_extracted, i.retry_count, \
                i.last_error, i.first_seen_at, i.last_attempt_at \
         FROM url_inventory i \
         WHERE i.url_key = ANY($1) \
           AND i.content_extracted = true \
           AND NOT EXISTS (SELECT 1 FROM url_content_facts f WHERE f.url_key = i.url_key) \
         ORDER BY i.first_seen_at",
    )
        .bind(keys)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Marks a URL as successfully extracted and clears its error state.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn record_extraction_success(pool: &PgPool, key: &str) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE url_inventory \
         SET content_extracted = true, last_error = NULL, last_attempt_at = NOW() \
         WHERE url_key = $1",
    )
    .bind(key)
    .execute(pool)
    .await?;

    Ok(())
}

/// Records a failed extraction attempt, bumping the retry counter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn record_extraction_failure(
    pool: &PgPool,
    key: &str,
    error: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE url_inventory \
         SET retry_count = retry_count + 1, last_error = $2, last_attempt_at = NOW() \
         WHERE url_key = $1",
    )
    .bind(key)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Resets the retry counter on URLs that hit the cap without being
/// extracted, making them eligible again. Returns the number of rows reset.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn reset_capped_urls(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE url_inventory \
         SET retry_count = 0, last_error = NULL \
         WHERE content_extracted = false AND retry_count >= $1",
    )
    .bind(MAX_EXTRACTION_RETRIES)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Inserts or replaces the content facts for a URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_content_facts(
    pool: &PgPool,
    key: &str,
    title: Option<&str>,
    extracted_text: Option<&str>,
    category: ContentCategory,
    classifier_confidence: Option<f64>,
    classifier_version: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO url_content_facts \
             (url_key, title, extracted_text, category, classifier_confidence, classifier_version) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (url_key) DO UPDATE SET \
             title = EXCLUDED.title, \
             extracted_text = EXCLUDED.extracted_text, \
             category = EXCLUDED.category, \
             classifier_confidence = EXCLUDED.classifier_confidence, \
             classifier_version = EXCLUDED.classifier_version, \
             classified_at = NOW()",
    )
    .bind(key)
    .bind(title)
    .bind(extracted_text)
    .bind(category.as_str())
    .bind(classifier_confidence)
    .bind(classifier_version)
    .execute(pool)
    .await?;

    Ok(())
}
