//! The daily-report pipeline: provider passes, the citation-URL pipeline,
//! aggregation, and completion reconciliation, orchestrated per brand per
//! calendar date.

pub mod aggregate;
pub mod bootstrap;
pub mod completion;
pub mod error;
pub mod orchestrator;
pub mod pass;
pub mod urls;

pub use aggregate::run_aggregation;
pub use bootstrap::{build_pipeline, BootstrapError};
pub use completion::reconcile_completion;
pub use error::ReportError;
pub use orchestrator::{Pipeline, PipelineConfig, ReportRunSummary};
pub use pass::{coarse_status, run_provider_pass, PassOutcome};
pub use urls::{process_report_urls, UrlOutcome};
