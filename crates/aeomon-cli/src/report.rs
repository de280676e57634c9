//! `report` command handlers: trigger a run for one brand, or show recent
//! report status.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use sqlx::PgPool;

use aeomon_core::AppConfig;
use aeomon_db::BrandRow;
use aeomon_report::build_pipeline;

/// Sub-commands available under `report`.
#[derive(Debug, Subcommand)]
pub enum ReportCommands {
    /// Generate (or resume) the daily report for one brand
    Generate {
        /// Brand slug
        #[arg(long)]
        brand: String,
        /// Report date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show recent reports for one brand
    Status {
        /// Brand slug
        #[arg(long)]
        brand: String,
        /// Maximum number of reports to show
        #[arg(long, default_value = "10")]
        limit: i64,
    },
}

pub(crate) async fn run(
    pool: &PgPool,
    config: &AppConfig,
    command: ReportCommands,
) -> anyhow::Result<()> {
    match command {
        ReportCommands::Generate { brand, date } => run_generate(pool, config, &brand, date).await,
        ReportCommands::Status { brand, limit } => run_status(pool, &brand, limit).await,
    }
}

async fn require_brand(pool: &PgPool, slug: &str) -> anyhow::Result<BrandRow> {
    aeomon_db::get_brand_by_slug(pool, slug)
        .await?
        .ok_or_else(|| anyhow::anyhow!("brand '{slug}' not found; run `seed` first"))
}

async fn run_generate(
    pool: &PgPool,
    config: &AppConfig,
    slug: &str,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let brand = require_brand(pool, slug).await?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    let pipeline = build_pipeline(pool.clone(), config)?;
    let summary = pipeline.generate_daily_report(&brand, date).await?;

    println!("report {} for {slug} on {date}", summary.public_id);
    println!("  generated:   {}", summary.generated);
    println!("  answer_llm:  {}", summary.answer_llm);
    println!("  web_search:  {}", summary.web_search);
    println!("  chat_scrape: {}", summary.chat_scrape);

    Ok(())
}

async fn run_status(pool: &PgPool, slug: &str, limit: i64) -> anyhow::Result<()> {
    let brand = require_brand(pool, slug).await?;
    let reports = aeomon_db::list_reports(pool, Some(brand.id), limit.clamp(1, 200)).await?;

    if reports.is_empty() {
        println!("no reports for '{slug}'; run `report generate` first");
        return Ok(());
    }

    let header = format!(
        "{:<12}{:<11}{:<11}{:<13}{:<13}{:<13}{:<7}MENTIONS",
        "DATE", "STATUS", "GENERATED", "ANSWER_LLM", "WEB_SEARCH", "CHAT_SCRAPE", "URLS"
    );
    println!("{header}");
    for report in &reports {
        let date = report.report_date.format("%Y-%m-%d").to_string();
        let urls = format!("{}/{}", report.urls_extracted, report.urls_total);
        println!(
            "{:<12}{:<11}{:<11}{:<13}{:<13}{:<13}{:<7}{}",
            date,
            report.status,
            report.generated,
            report.answer_llm_status,
            report.web_search_status,
            report.chat_scrape_status,
            urls,
            report.total_mentions
        );
    }

    Ok(())
}
