//! Content-structure classifier for cited URLs.
//!
//! Two tiers: a cheap heuristic over the URL and title short-circuits the
//! obvious cases (known forum/news/video domains, docs paths, "top N" and
//! "vs" titles), and everything else goes to an LLM that must answer with a
//! JSON category + confidence. Any failure along the way falls back to the
//! default category instead of propagating: a missing classification must
//! never block a report.

use regex::Regex;

use aeomon_core::ContentCategory;
use aeomon_providers::CompletionsClient;

/// Version tag stored with heuristic classifications.
pub const HEURISTIC_VERSION: &str = "heuristic-v1";
/// Version tag stored with LLM (and fallback) classifications.
pub const LLM_VERSION: &str = "llm-v1";

/// Confidence recorded for heuristic short-circuit matches.
const HEURISTIC_CONFIDENCE: f64 = 0.95;

const FORUM_DOMAINS: &[&str] = &[
    "reddit.com",
    "news.ycombinator.com",
    "stackoverflow.com",
    "stackexchange.com",
    "quora.com",
];

const VIDEO_DOMAINS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com"];

const NEWS_DOMAINS: &[&str] = &[
    "techcrunch.com",
    "theverge.com",
    "reuters.com",
    "bloomberg.com",
    "wired.com",
    "zdnet.com",
];

/// A category assignment with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: ContentCategory,
    pub confidence: Option<f64>,
    pub version: &'static str,
}

impl Classification {
    fn heuristic(category: ContentCategory) -> Self {
        Self {
            category,
            confidence: Some(HEURISTIC_CONFIDENCE),
            version: HEURISTIC_VERSION,
        }
    }

    fn fallback() -> Self {
        Self {
            category: ContentCategory::DEFAULT,
            confidence: None,
            version: LLM_VERSION,
        }
    }
}

/// Classifies a URL from its domain, path, and title alone, or returns
/// `None` when no pattern is confident enough.
#[must_use]
pub fn classify_heuristic(url: &str, title: Option<&str>) -> Option<Classification> {
    let lower_url = url.to_lowercase();
    let host = host_of(&lower_url);

    if domain_matches(&host, FORUM_DOMAINS) {
        return Some(Classification::heuristic(ContentCategory::ForumThread));
    }
    if domain_matches(&host, VIDEO_DOMAINS) {
        return Some(Classification::heuristic(ContentCategory::Video));
    }
    if domain_matches(&host, NEWS_DOMAINS) {
        return Some(Classification::heuristic(ContentCategory::NewsArticle));
    }
    if host.starts_with("docs.") || lower_url.contains("/docs/") || lower_url.contains("/documentation/") {
        return Some(Classification::heuristic(ContentCategory::OfficialDocs));
    }

    if let Some(title) = title {
        let listicle = Regex::new(r"(?i)\b(top|best)\s+\d+\b").expect("valid listicle regex");
        if listicle.is_match(title) {
            return Some(Classification::heuristic(ContentCategory::Listicle));
        }
        let comparison = Regex::new(r"(?i)\bvs\.?\s").expect("valid comparison regex");
        if comparison.is_match(title) {
            return Some(Classification::heuristic(ContentCategory::Comparison));
        }
        let how_to = Regex::new(r"(?i)\bhow\s+to\b").expect("valid how-to regex");
        if how_to.is_match(title) {
            return Some(Classification::heuristic(ContentCategory::HowToGuide));
        }
    }

    None
}

fn host_of(url: &str) -> String {
    let rest = url.split("://").nth(1).unwrap_or(url);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = host.split(':').next().unwrap_or(host);
    host.trim_start_matches("www.").to_owned()
}

fn domain_matches(host: &str, domains: &[&str]) -> bool {
    domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// The full two-tier classifier.
pub struct UrlClassifier {
    completions: CompletionsClient,
}

impl UrlClassifier {
    #[must_use]
    pub fn new(completions: CompletionsClient) -> Self {
        Self { completions }
    }

    /// Classifies one URL. Infallible: heuristic first, then the LLM, then
    /// the default category when the LLM errors or answers garbage.
    pub async fn classify(
        &self,
        url: &str,
        title: Option<&str>,
        snippet: Option<&str>,
    ) -> Classification {
        if let Some(classification) = classify_heuristic(url, title) {
            return classification;
        }

        let system = llm_system_prompt();
        let user = format!(
            "URL: {url}\nTitle: {}\nSnippet: {}",
            title.unwrap_or("(none)"),
            snippet.unwrap_or("(none)"),
        );

        match self.completions.complete_json(&system, &user).await {
            Ok(value) => {
                let category = value
                    .get("category")
                    .and_then(serde_json::Value::as_str)
                    .and_then(ContentCategory::parse);
                let confidence = value.get("confidence").and_then(serde_json::Value::as_f64);
                match category {
                    Some(category) => Classification {
                        category,
                        confidence,
                        version: LLM_VERSION,
                    },
                    None => {
                        tracing::warn!(url, "classifier returned unknown category, using default");
                        Classification::fallback()
                    }
                }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "classification call failed, using default");
                Classification::fallback()
            }
        }
    }
}

fn llm_system_prompt() -> String {
    let labels: Vec<&str> = ContentCategory::ALL.iter().map(|c| c.as_str()).collect();
    format!(
        "You classify web pages by content structure. Answer with JSON only: \
         {{\"category\": <label>, \"confidence\": <0..1>}}. \
         Valid labels: {}.",
        labels.join(", ")
    )
}
