//! The daily-report orchestrator.
//!
//! Stitches the stages together for one brand and one date: idempotent
//! report lookup-or-insert, one pass per provider not yet terminal, the URL
//! pipeline, the aggregators, and completion reconciliation. Everything is
//! sequential; re-running any part converges because every write along the
//! way is an upsert.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aeomon_core::ProviderStatus;
use aeomon_db::{
    get_or_create_report, get_report, list_active_brands, list_active_prompts, list_competitors,
    mark_failed, BrandRow,
};
use aeomon_content::{ExtractorClient, UrlClassifier};
use aeomon_providers::{AnswerProvider, CompletionsClient};

use crate::aggregate::run_aggregation;
use crate::completion::reconcile_completion;
use crate::error::ReportError;
use crate::pass::run_provider_pass;
use crate::urls::process_report_urls;

/// Pacing knobs for the sequential pipeline. Both delays exist only to
/// respect third-party rate limits.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub inter_prompt_delay: Duration,
    pub inter_brand_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inter_prompt_delay: Duration::from_millis(1_500),
            inter_brand_delay: Duration::from_millis(2_000),
        }
    }
}

/// What a report run produced, as returned to the trigger endpoint and CLI.
#[derive(Debug, Clone)]
pub struct ReportRunSummary {
    pub report_id: i64,
    pub public_id: Uuid,
    pub brand_slug: String,
    pub generated: bool,
    pub answer_llm: ProviderStatus,
    pub web_search: ProviderStatus,
    pub chat_scrape: ProviderStatus,
    pub is_complete: bool,
}

/// The assembled daily-report pipeline.
pub struct Pipeline {
    pool: PgPool,
    providers: Vec<Arc<dyn AnswerProvider>>,
    extractor: ExtractorClient,
    classifier: UrlClassifier,
    completions: CompletionsClient,
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        pool: PgPool,
        providers: Vec<Arc<dyn AnswerProvider>>,
        extractor: ExtractorClient,
        classifier: UrlClassifier,
        completions: CompletionsClient,
        config: PipelineConfig,
    ) -> Self {
        Self {
            pool,
            providers,
            extractor,
            classifier,
            completions,
            config,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Generates (or resumes) the report for `brand` on `date`.
    ///
    /// Fatal errors mark the report `failed` with the message persisted,
    /// then propagate.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Db`] on database failures.
    pub async fn generate_daily_report(
        &self,
        brand: &BrandRow,
        date: NaiveDate,
    ) -> Result<ReportRunSummary, ReportError> {
        let report = get_or_create_report(&self.pool, brand.id, date).await?;
        tracing::info!(
            brand = %brand.slug,
            report_id = report.id,
            %date,
            "daily report run starting"
        );

        match self.run_stages(brand, report.id, date).await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!(brand = %brand.slug, report_id = report.id, error = %e, "report run failed");
                mark_failed(&self.pool, report.id, &e.to_string()).await?;
                return Err(e);
            }
        }

        let final_report = get_report(&self.pool, report.id).await?;
        Ok(ReportRunSummary {
            report_id: final_report.id,
            public_id: final_report.public_id,
            brand_slug: brand.slug.clone(),
            generated: final_report.generated,
            answer_llm: final_report.provider_status(aeomon_core::ProviderKind::AnswerLlm),
            web_search: final_report.provider_status(aeomon_core::ProviderKind::WebSearch),
            chat_scrape: final_report.provider_status(aeomon_core::ProviderKind::ChatScrape),
            is_complete: final_report.generated,
        })
    }

    async fn run_stages(
        &self,
        brand: &BrandRow,
        report_id: i64,
        date: NaiveDate,
    ) -> Result<(), ReportError> {
        let prompts = list_active_prompts(&self.pool, brand.id).await?;
        let competitors: Vec<String> = list_competitors(&self.pool, brand.id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        for provider in &self.providers {
            let current = get_report(&self.pool, report_id)
                .await?
                .provider_status(provider.kind());
            if current.is_terminal() {
                tracing::debug!(
                    brand = %brand.slug,
                    provider = %provider.kind(),
                    status = %current,
                    "provider pass already terminal, skipping"
                );
                continue;
            }
            run_provider_pass(
                &self.pool,
                provider.as_ref(),
                report_id,
                &prompts,
                &brand.name,
                &competitors,
                self.config.inter_prompt_delay,
            )
            .await?;
        }

        process_report_urls(&self.pool, &self.extractor, &self.classifier, report_id).await?;
        run_aggregation(
            &self.pool,
            &self.completions,
            report_id,
            &brand.name,
            &competitors,
        )
        .await?;
        reconcile_completion(&self.pool, report_id, Utc::now().date_naive()).await?;

        Ok(())
    }

    /// Runs today's report for every active brand, sequentially.
    ///
    /// Per-brand failures are logged and skipped; the run continues with
    /// the next brand.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Db`] only if the brand list itself cannot be
    /// read.
    pub async fn run_all_brands(&self, date: NaiveDate) -> Result<Vec<ReportRunSummary>, ReportError> {
        let brands = list_active_brands(&self.pool).await?;
        let mut summaries = Vec::with_capacity(brands.len());

        for (index, brand) in brands.iter().enumerate() {
            if index > 0 && !self.config.inter_brand_delay.is_zero() {
                tokio::time::sleep(self.config.inter_brand_delay).await;
            }
            match self.generate_daily_report(brand, date).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    tracing::error!(brand = %brand.slug, error = %e, "brand report failed, continuing");
                }
            }
        }

        tracing::info!(
            brands = brands.len(),
            succeeded = summaries.len(),
            %date,
            "all-brands run finished"
        );
        Ok(summaries)
    }
}
