//! Report-completion derivation.
//!
//! There is no transition-driven state machine here on purpose: the pipeline
//! stays resumable because "is this report done" is re-derived from the
//! current status fields on every orchestrator pass. This module is the
//! single place that rule lives, as a pure function over a flags snapshot.

use aeomon_core::{ProviderKind, ProviderStatus, UrlProcessingStatus};

/// Snapshot of the status fields the completion rule reads.
#[derive(Debug, Clone, Copy)]
pub struct CompletionFlags {
    pub answer_llm: ProviderStatus,
    pub web_search: ProviderStatus,
    pub chat_scrape: ProviderStatus,
    pub url_processing: UrlProcessingStatus,
    /// Whether the report's date is the current calendar date. Past-date
    /// reports relax the web-search attendance requirement.
    pub report_is_today: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionDecision {
    pub is_complete: bool,
}

/// Whether a provider pass counts as "attempted" for completion purposes.
///
/// Any status past `not_started` qualifies, including `running`: a pass that
/// has started but not finished still blocks completion through the primary
/// `complete` requirement, not through attendance.
#[must_use]
pub fn provider_attempted(status: ProviderStatus) -> bool {
    !matches!(status, ProviderStatus::NotStarted)
}

/// Derive whether a report is complete from its current flags.
///
/// Completion requires all three of:
/// 1. the primary provider ([`ProviderKind::AnswerLlm`]) finished `complete`;
/// 2. every scheduled provider attempted — with the asymmetric rule that the
///    web-search provider on a past-date report is treated as attempted
///    (`expired`) even if it never started, since its scheduled window is
///    gone and waiting for it would wedge the report forever;
/// 3. URL processing finished `complete`.
#[must_use]
pub fn derive_completion(flags: CompletionFlags) -> CompletionDecision {
    let primary_complete = flags.answer_llm == ProviderStatus::Complete;

    let web_search_attempted = provider_attempted(flags.web_search) || !flags.report_is_today;
    let all_attempted = provider_attempted(flags.answer_llm)
        && web_search_attempted
        && provider_attempted(flags.chat_scrape);

    let urls_done = flags.url_processing == UrlProcessingStatus::Complete;

    CompletionDecision {
        is_complete: primary_complete && all_attempted && urls_done,
    }
}

/// The effective status to persist for an unattempted web-search pass on a
/// past-date report when the reconciler closes the report out.
#[must_use]
pub fn expired_status_for(kind: ProviderKind, current: ProviderStatus) -> ProviderStatus {
    if kind == ProviderKind::WebSearch && current == ProviderStatus::NotStarted {
        ProviderStatus::Expired
    } else {
        current
    }
}

/// The status to persist for a secondary pass when the reconciler closes a
/// report out. A pass still recorded `running` at that point belongs to a
/// crashed earlier invocation that never wrote a verdict; it closes as
/// `failed` so a generated report carries only terminal pass statuses.
#[must_use]
pub fn closeout_status_for(current: ProviderStatus) -> ProviderStatus {
    if current == ProviderStatus::Running {
        ProviderStatus::Failed
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(
        answer_llm: ProviderStatus,
        web_search: ProviderStatus,
        chat_scrape: ProviderStatus,
        url_processing: UrlProcessingStatus,
        report_is_today: bool,
    ) -> CompletionFlags {
        CompletionFlags {
            answer_llm,
            web_search,
            chat_scrape,
            url_processing,
            report_is_today,
        }
    }

    #[test]
    fn all_complete_is_complete() {
        let decision = derive_completion(flags(
            ProviderStatus::Complete,
            ProviderStatus::Complete,
            ProviderStatus::Complete,
            UrlProcessingStatus::Complete,
            true,
        ));
        assert!(decision.is_complete);
    }

    #[test]
    fn primary_failure_blocks_completion() {
        let decision = derive_completion(flags(
            ProviderStatus::Failed,
            ProviderStatus::Complete,
            ProviderStatus::Complete,
            UrlProcessingStatus::Complete,
            true,
        ));
        assert!(!decision.is_complete);
    }

    #[test]
    fn secondary_failure_does_not_block_completion() {
        // Secondary providers only need to have been attempted.
        let decision = derive_completion(flags(
            ProviderStatus::Complete,
            ProviderStatus::Failed,
            ProviderStatus::Failed,
            UrlProcessingStatus::Complete,
            true,
        ));
        assert!(decision.is_complete);
    }

    #[test]
    fn pending_url_processing_blocks_completion() {
        for url_status in [
            UrlProcessingStatus::NotStarted,
            UrlProcessingStatus::Running,
            UrlProcessingStatus::Failed,
        ] {
            let decision = derive_completion(flags(
                ProviderStatus::Complete,
                ProviderStatus::Complete,
                ProviderStatus::Complete,
                url_status,
                true,
            ));
            assert!(
                !decision.is_complete,
                "url status {url_status:?} should block completion"
            );
        }
    }

    #[test]
    fn unstarted_web_search_blocks_todays_report() {
        let decision = derive_completion(flags(
            ProviderStatus::Complete,
            ProviderStatus::NotStarted,
            ProviderStatus::Complete,
            UrlProcessingStatus::Complete,
            true,
        ));
        assert!(!decision.is_complete);
    }

    #[test]
    fn unstarted_web_search_is_expired_on_past_report() {
        let decision = derive_completion(flags(
            ProviderStatus::Complete,
            ProviderStatus::NotStarted,
            ProviderStatus::Complete,
            UrlProcessingStatus::Complete,
            false,
        ));
        assert!(decision.is_complete);
    }

    #[test]
    fn unstarted_chat_scrape_blocks_even_past_reports() {
        // The past-date relaxation applies to web search only.
        let decision = derive_completion(flags(
            ProviderStatus::Complete,
            ProviderStatus::Complete,
            ProviderStatus::NotStarted,
            UrlProcessingStatus::Complete,
            false,
        ));
        assert!(!decision.is_complete);
    }

    #[test]
    fn attempted_statuses_truth_table() {
        assert!(!provider_attempted(ProviderStatus::NotStarted));
        assert!(provider_attempted(ProviderStatus::Running));
        assert!(provider_attempted(ProviderStatus::Complete));
        assert!(provider_attempted(ProviderStatus::Failed));
        assert!(provider_attempted(ProviderStatus::Expired));
        assert!(provider_attempted(ProviderStatus::Skipped));
    }

    #[test]
    fn running_primary_blocks_completion() {
        let decision = derive_completion(flags(
            ProviderStatus::Running,
            ProviderStatus::Complete,
            ProviderStatus::Complete,
            UrlProcessingStatus::Complete,
            true,
        ));
        assert!(!decision.is_complete);
    }

    #[test]
    fn skipped_and_expired_secondaries_satisfy_attendance() {
        let decision = derive_completion(flags(
            ProviderStatus::Complete,
            ProviderStatus::Expired,
            ProviderStatus::Skipped,
            UrlProcessingStatus::Complete,
            true,
        ));
        assert!(decision.is_complete);
    }

    #[test]
    fn expired_status_only_rewrites_unstarted_web_search() {
        assert_eq!(
            expired_status_for(ProviderKind::WebSearch, ProviderStatus::NotStarted),
            ProviderStatus::Expired
        );
        assert_eq!(
            expired_status_for(ProviderKind::WebSearch, ProviderStatus::Failed),
            ProviderStatus::Failed
        );
        assert_eq!(
            expired_status_for(ProviderKind::ChatScrape, ProviderStatus::NotStarted),
            ProviderStatus::NotStarted
        );
    }

    #[test]
    fn closeout_fails_only_running_passes() {
        assert_eq!(
            closeout_status_for(ProviderStatus::Running),
            ProviderStatus::Failed
        );
        for status in [
            ProviderStatus::NotStarted,
            ProviderStatus::Complete,
            ProviderStatus::Failed,
            ProviderStatus::Expired,
            ProviderStatus::Skipped,
        ] {
            assert_eq!(closeout_status_for(status), status);
        }
    }

    #[test]
    fn derivation_is_idempotent() {
        let f = flags(
            ProviderStatus::Complete,
            ProviderStatus::Complete,
            ProviderStatus::Complete,
            UrlProcessingStatus::Complete,
            true,
        );
        assert_eq!(derive_completion(f), derive_completion(f));
    }
}
