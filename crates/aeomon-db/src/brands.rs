//! Database operations for `brands`, `competitors`, and `brand_prompts`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `competitors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    pub domain: Option<String>,
    pub is_active: bool,
}

/// A row from the `brand_prompts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PromptRow {
    pub id: i64,
    pub brand_id: i64,
    pub text: String,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all active brands, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_brands(pool: &PgPool) -> Result<Vec<BrandRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandRow>(
        "SELECT id, public_id, name, slug, domain, is_active, created_at, updated_at \
         FROM brands \
         WHERE is_active = true \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single active brand by slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_by_slug(pool: &PgPool, slug: &str) -> Result<Option<BrandRow>, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "SELECT id, public_id, name, slug, domain, is_active, created_at, updated_at \
         FROM brands \
         WHERE slug = $1 AND is_active = true",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the active competitors for a brand, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_competitors(pool: &PgPool, brand_id: i64) -> Result<Vec<CompetitorRow>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, brand_id, name, domain, is_active \
         FROM competitors \
         WHERE brand_id = $1 AND is_active = true \
         ORDER BY name",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the active tracked prompts for a brand, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_prompts(pool: &PgPool, brand_id: i64) -> Result<Vec<PromptRow>, DbError> {
    let rows = sqlx::query_as::<_, PromptRow>(
        "SELECT id, brand_id, text, is_active \
         FROM brand_prompts \
         WHERE brand_id = $1 AND is_active = true \
         ORDER BY id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Active competitor and prompt counts for one brand.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct BrandChildCounts {
    pub brand_id: i64,
    pub competitor_count: i64,
    pub prompt_count: i64,
}

/// Returns competitor/prompt counts for every active brand, keyed by brand id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_brand_children(
    pool: &PgPool,
) -> Result<std::collections::HashMap<i64, BrandChildCounts>, DbError> {
    let rows = sqlx::query_as::<_, BrandChildCounts>(
        "SELECT b.id AS brand_id, \
                (SELECT COUNT(*) FROM competitors c \
                  WHERE c.brand_id = b.id AND c.is_active) AS competitor_count, \
                (SELECT COUNT(*) FROM brand_prompts p \
                  WHERE p.brand_id = b.id AND p.is_active) AS prompt_count \
         FROM brands b \
         WHERE b.is_active = true",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| (r.brand_id, r)).collect())
}

/// Inserts or updates a brand by slug, returning its id.
///
/// Conflicts on `slug` update `name`, `domain`, and reactivate the brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_brand(
    pool: &PgPool,
    name: &str,
    slug: &str,
    domain: Option<&str>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO brands (public_id, name, slug, domain) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (slug) DO UPDATE SET \
             name = EXCLUDED.name, \
             domain = EXCLUDED.domain, \
             is_active = true, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(domain)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Inserts or reactivates a competitor for a brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_competitor(
    pool: &PgPool,
    brand_id: i64,
    name: &str,
    domain: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO competitors (brand_id, name, domain) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (brand_id, name) DO UPDATE SET \
             domain = EXCLUDED.domain, \
             is_active = true",
    )
    .bind(brand_id)
    .bind(name)
    .bind(domain)
    .execute(pool)
    .await?;

    Ok(())
}

/// Inserts or reactivates a tracked prompt for a brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_prompt(pool: &PgPool, brand_id: i64, text: &str) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO brand_prompts (brand_id, text) \
         VALUES ($1, $2) \
         ON CONFLICT (brand_id, text) DO UPDATE SET is_active = true",
    )
    .bind(brand_id)
    .bind(text)
    .execute(pool)
    .await?;

    Ok(())
}
