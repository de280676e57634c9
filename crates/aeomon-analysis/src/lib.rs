//! Pure analysis functions for the daily-report pipeline.
//!
//! Everything in this crate is deterministic and side-effect free: mention
//! detection, the sentiment window heuristic, rank and sentiment aggregation,
//! citation-share math, the visibility score, share-of-voice entity handling,
//! and the report-completion derivation. The `aeomon-report` crate supplies
//! the database reads/writes around these functions.

pub mod citation;
pub mod completion;
pub mod mention;
pub mod rank;
pub mod share_of_voice;
pub mod visibility;

pub use citation::{compute_citation_shares, normalize_domain, DomainShare};
pub use completion::{
    closeout_status_for, derive_completion, expired_status_for, provider_attempted,
    CompletionDecision, CompletionFlags,
};
pub use mention::{analyze, CompetitorMention, MentionAnalysis};
pub use rank::{aggregate_rank_sentiment, RankSentimentSummary, ResultMentions, SentimentBuckets};
pub use share_of_voice::{
    build_sov_corpus, categorize_entity, merge_entities, SovCategory, SovEntity, SovSummary,
};
pub use visibility::{visibility_score, ResultVisibility, VisibilityBreakdown};
