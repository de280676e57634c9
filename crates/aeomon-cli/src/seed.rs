//! `seed` command: load the YAML seed file and upsert its contents.

use std::path::Path;

use sqlx::PgPool;

use aeomon_core::load_seed;
use aeomon_db::{upsert_brand, upsert_competitor, upsert_prompt};

/// Upserts every brand, competitor, and prompt from the seed file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or any upsert fails.
pub(crate) async fn run_seed(pool: &PgPool, path: &Path) -> anyhow::Result<()> {
    let seed = load_seed(path)?;

    for brand in &seed.brands {
        let slug = brand.slug();
        let brand_id = upsert_brand(pool, &brand.name, &slug, brand.domain.as_deref()).await?;

        for competitor in &brand.competitors {
            upsert_competitor(pool, brand_id, &competitor.name, competitor.domain.as_deref())
                .await?;
        }
        for prompt in &brand.prompts {
            upsert_prompt(pool, brand_id, prompt).await?;
        }

        println!(
            "seeded {slug} ({} competitors, {} prompts)",
            brand.competitors.len(),
            brand.prompts.len()
        );
    }

    println!("{} brand(s) seeded from {}", seed.brands.len(), path.display());
    Ok(())
}
