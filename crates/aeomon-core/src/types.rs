//! Shared domain enums for the reporting pipeline.
//!
//! Every enum here is stored in Postgres as its lowercase string form, so
//! each carries an `as_str`/`parse` pair that round-trips exactly.

use serde::{Deserialize, Serialize};

/// The external AI answer providers a report is scheduled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Search-augmented chat-completions API. The primary provider: report
    /// completion requires this pass to finish `complete`.
    AnswerLlm,
    /// Web-search answer API (answer box + organic snippets).
    WebSearch,
    /// Browser-automation relay in front of a chat UI.
    ChatScrape,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::AnswerLlm,
        ProviderKind::WebSearch,
        ProviderKind::ChatScrape,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::AnswerLlm => "answer_llm",
            ProviderKind::WebSearch => "web_search",
            ProviderKind::ChatScrape => "chat_scrape",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "answer_llm" => Some(ProviderKind::AnswerLlm),
            "web_search" => Some(ProviderKind::WebSearch),
            "chat_scrape" => Some(ProviderKind::ChatScrape),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-provider pass status on a daily report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    NotStarted,
    Running,
    Complete,
    Failed,
    Expired,
    Skipped,
}

impl ProviderStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderStatus::NotStarted => "not_started",
            ProviderStatus::Running => "running",
            ProviderStatus::Complete => "complete",
            ProviderStatus::Failed => "failed",
            ProviderStatus::Expired => "expired",
            ProviderStatus::Skipped => "skipped",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(ProviderStatus::NotStarted),
            "running" => Some(ProviderStatus::Running),
            "complete" => Some(ProviderStatus::Complete),
            "failed" => Some(ProviderStatus::Failed),
            "expired" => Some(ProviderStatus::Expired),
            "skipped" => Some(ProviderStatus::Skipped),
            _ => None,
        }
    }

    /// Terminal statuses: a pass in one of these will not be re-run by the
    /// orchestrator on a resumed invocation.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProviderStatus::Complete
                | ProviderStatus::Failed
                | ProviderStatus::Expired
                | ProviderStatus::Skipped
        )
    }
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single (report, prompt, provider) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderResultStatus {
    /// The provider returned usable answer text.
    Ok,
    /// The provider succeeded but had nothing to say. Not a fault.
    NoResult,
    /// The call failed; the error message is recorded on the row.
    Error,
}

impl ProviderResultStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderResultStatus::Ok => "ok",
            ProviderResultStatus::NoResult => "no_result",
            ProviderResultStatus::Error => "error",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(ProviderResultStatus::Ok),
            "no_result" => Some(ProviderResultStatus::NoResult),
            "error" => Some(ProviderResultStatus::Error),
            _ => None,
        }
    }
}

/// Status of the citation-URL extraction/classification stage for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlProcessingStatus {
    NotStarted,
    Running,
    Complete,
    Failed,
}

impl UrlProcessingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UrlProcessingStatus::NotStarted => "not_started",
            UrlProcessingStatus::Running => "running",
            UrlProcessingStatus::Complete => "complete",
            UrlProcessingStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(UrlProcessingStatus::NotStarted),
            "running" => Some(UrlProcessingStatus::Running),
            "complete" => Some(UrlProcessingStatus::Complete),
            "failed" => Some(UrlProcessingStatus::Failed),
            _ => None,
        }
    }
}

/// Overall report lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Running,
    Completed,
    Failed,
}

impl ReportStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Running => "running",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(ReportStatus::Running),
            "completed" => Some(ReportStatus::Completed),
            "failed" => Some(ReportStatus::Failed),
            _ => None,
        }
    }
}

/// Fixed content-structure taxonomy for cited URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    OfficialDocs,
    BlogPost,
    HowToGuide,
    Comparison,
    Listicle,
    Review,
    NewsArticle,
    ForumThread,
    Video,
    ProductPage,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 10] = [
        ContentCategory::OfficialDocs,
        ContentCategory::BlogPost,
        ContentCategory::HowToGuide,
        ContentCategory::Comparison,
        ContentCategory::Listicle,
        ContentCategory::Review,
        ContentCategory::NewsArticle,
        ContentCategory::ForumThread,
        ContentCategory::Video,
        ContentCategory::ProductPage,
    ];

    /// Fallback label when classification fails or returns something
    /// outside the taxonomy.
    pub const DEFAULT: ContentCategory = ContentCategory::BlogPost;

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::OfficialDocs => "official_docs",
            ContentCategory::BlogPost => "blog_post",
            ContentCategory::HowToGuide => "how_to_guide",
            ContentCategory::Comparison => "comparison",
            ContentCategory::Listicle => "listicle",
            ContentCategory::Review => "review",
            ContentCategory::NewsArticle => "news_article",
            ContentCategory::ForumThread => "forum_thread",
            ContentCategory::Video => "video",
            ContentCategory::ProductPage => "product_page",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "official_docs" => Some(ContentCategory::OfficialDocs),
            "blog_post" => Some(ContentCategory::BlogPost),
            "how_to_guide" => Some(ContentCategory::HowToGuide),
            "comparison" => Some(ContentCategory::Comparison),
            "listicle" => Some(ContentCategory::Listicle),
            "review" => Some(ContentCategory::Review),
            "news_article" => Some(ContentCategory::NewsArticle),
            "forum_thread" => Some(ContentCategory::ForumThread),
            "video" => Some(ContentCategory::Video),
            "product_page" => Some(ContentCategory::ProductPage),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_round_trips() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ProviderKind::parse("perplexity"), None);
    }

    #[test]
    fn provider_status_terminal_set() {
        assert!(ProviderStatus::Complete.is_terminal());
        assert!(ProviderStatus::Failed.is_terminal());
        assert!(ProviderStatus::Expired.is_terminal());
        assert!(ProviderStatus::Skipped.is_terminal());
        assert!(!ProviderStatus::NotStarted.is_terminal());
        assert!(!ProviderStatus::Running.is_terminal());
    }

    #[test]
    fn provider_status_round_trips() {
        for s in [
            ProviderStatus::NotStarted,
            ProviderStatus::Running,
            ProviderStatus::Complete,
            ProviderStatus::Failed,
            ProviderStatus::Expired,
            ProviderStatus::Skipped,
        ] {
            assert_eq!(ProviderStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn content_category_round_trips() {
        for c in ContentCategory::ALL {
            assert_eq!(ContentCategory::parse(c.as_str()), Some(c));
        }
        assert_eq!(ContentCategory::parse("press_release"), None);
    }

    #[test]
    fn content_category_default_is_blog_post() {
        assert_eq!(ContentCategory::DEFAULT, ContentCategory::BlogPost);
    }

    #[test]
    fn serde_forms_match_as_str() {
        let json = serde_json::to_string(&ProviderKind::AnswerLlm).expect("serialize");
        assert_eq!(json, "\"answer_llm\"");
        let json = serde_json::to_string(&ContentCategory::HowToGuide).expect("serialize");
        assert_eq!(json, "\"how_to_guide\"");
    }
}
