//! Database operations for the `citation_share_stats` table.
//!
//! Shares are a derived snapshot per report: recomputation replaces the
//! whole set inside one transaction so readers never see a partial mix of
//! old and new rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `citation_share_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CitationShareRow {
    pub id: i64,
    pub report_id: i64,
    pub domain: String,
    pub citation_count: i32,
    pub share_pct: Decimal,
    pub rank: i32,
    pub created_at: DateTime<Utc>,
}

/// One domain's share to be written for a report.
#[derive(Debug, Clone)]
pub struct NewCitationShare {
    pub domain: String,
    pub citation_count: i32,
    pub share_pct: Decimal,
    pub rank: i32,
}

/// Replaces the full set of citation shares for a report.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction fails.
pub async fn replace_report_shares(
    pool: &PgPool,
    report_id: i64,
    shares: &[NewCitationShare],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM citation_share_stats WHERE report_id = $1")
        .bind(report_id)
        .execute(&mut *tx)
        .await?;

    for share in shares {
        sqlx::query(
            "INSERT INTO citation_share_stats \
                 (report_id, domain, citation_count, share_pct, rank) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(report_id)
        .bind(&share.domain)
        .bind(share.citation_count)
        .bind(share.share_pct)
        .bind(share.rank)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Returns a report's citation shares ordered by rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_shares_for_report(
    pool: &PgPool,
    report_id: i64,
) -> Result<Vec<CitationShareRow>, DbError> {
    let rows = sqlx::query_as::<_, CitationShareRow>(
        "SELECT id, report_id, domain, citation_count, share_pct, rank, created_at \
         FROM citation_share_stats \
         WHERE report_id = $1 \
         ORDER BY rank, domain",
    )
    .bind(report_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
