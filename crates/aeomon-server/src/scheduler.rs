use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use aeomon_report::Pipeline;

/// Daily report run at 06:00 UTC.
const DAILY_SCHEDULE: &str = "0 0 6 * * *";

/// Builds and starts the cron scheduler with the daily all-brands job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler or job cannot be created.
pub async fn build_scheduler(pipeline: Arc<Pipeline>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(DAILY_SCHEDULE, move |_id, _scheduler| {
        let pipeline = Arc::clone(&pipeline);
        Box::pin(async move {
            let date = Utc::now().date_naive();
            tracing::info!(%date, "scheduled daily report run starting");
            match pipeline.run_all_brands(date).await {
                Ok(summaries) => {
                    tracing::info!(reports = summaries.len(), "scheduled daily report run finished");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduled daily report run failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = DAILY_SCHEDULE, "daily report job registered");
    Ok(scheduler)
}
