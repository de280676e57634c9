//! Brand/competitor mention detection and the sentiment window heuristic.
//!
//! Mention detection is case-insensitive substring search; positions are
//! character offsets into the answer text. Sentiment is a keyword-proximity
//! heuristic over a ±100-character window around the first brand mention —
//! a cheap pre-filter, not an NLP model.

use serde::{Deserialize, Serialize};

/// Characters of context inspected on each side of the first brand mention.
const SENTIMENT_WINDOW: usize = 100;

/// Score contribution of a single keyword hit inside the window.
const SENTIMENT_STEP: f64 = 0.3;

const POSITIVE_WORDS: &[&str] = &[
    "best",
    "excellent",
    "great",
    "good",
    "leading",
    "love",
    "popular",
    "powerful",
    "recommend",
    "recommended",
    "reliable",
    "reliability",
    "robust",
    "top",
    "trusted",
    "quality",
];

const NEGATIVE_WORDS: &[&str] = &[
    "avoid",
    "bad",
    "buggy",
    "complaint",
    "complaints",
    "disappointing",
    "expensive",
    "outdated",
    "poor",
    "problem",
    "problems",
    "slow",
    "terrible",
    "unreliable",
    "worst",
];

/// A competitor with at least one occurrence in the answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorMention {
    pub name: String,
    pub count: usize,
    pub first_position: usize,
}

/// Result of scanning one answer text for a brand and its competitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionAnalysis {
    pub mentioned: bool,
    pub mention_count: usize,
    /// Character offset of the first brand occurrence, `-1` if unmentioned.
    pub position: i64,
    /// In `[-1.0, 1.0]`; `0.0` whenever the brand is not mentioned.
    pub sentiment: f64,
    pub competitor_mentions: Vec<CompetitorMention>,
}

/// Scan `text` for the brand and each competitor name.
#[must_use]
pub fn analyze(text: &str, brand: &str, competitors: &[String]) -> MentionAnalysis {
    let chars: Vec<char> = text.chars().collect();
    let brand_hits = occurrences(&chars, brand);

    let competitor_mentions: Vec<CompetitorMention> = competitors
        .iter()
        .filter_map(|name| {
            let hits = occurrences(&chars, name);
            hits.first().map(|&first| CompetitorMention {
                name: name.clone(),
                count: hits.len(),
                first_position: first,
            })
        })
        .collect();

    match brand_hits.first() {
        Some(&first) => MentionAnalysis {
            mentioned: true,
            mention_count: brand_hits.len(),
            position: i64::try_from(first).unwrap_or(i64::MAX),
            sentiment: window_sentiment(&chars, first),
            competitor_mentions,
        },
        None => MentionAnalysis {
            mentioned: false,
            mention_count: 0,
            position: -1,
            sentiment: 0.0,
            competitor_mentions,
        },
    }
}

/// Every character offset at which `needle` occurs in `haystack`,
/// case-insensitively. Empty needles never match.
fn occurrences(haystack: &[char], needle: &str) -> Vec<usize> {
    let needle: Vec<char> = needle.to_lowercase().chars().collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }

    let lowered: Vec<char> = haystack
        .iter()
        .flat_map(|c| c.to_lowercase())
        .collect();
    // Lowercasing can expand certain characters; fall back to a direct scan
    // when lengths diverge so offsets stay aligned with the original text.
    let scan: &[char] = if lowered.len() == haystack.len() {
        &lowered
    } else {
        haystack
    };

    scan.windows(needle.len())
        .enumerate()
        .filter(|(_, window)| {
            window
                .iter()
                .zip(&needle)
                .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Keyword sentiment over a ±100-character window around `center`.
fn window_sentiment(chars: &[char], center: usize) -> f64 {
    let start = center.saturating_sub(SENTIMENT_WINDOW);
    let end = (center + SENTIMENT_WINDOW).min(chars.len());
    let window: String = chars[start..end].iter().collect();

    let mut score = 0.0_f64;
    for word in window.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        if POSITIVE_WORDS.contains(&w.as_str()) {
            score += SENTIMENT_STEP;
        } else if NEGATIVE_WORDS.contains(&w.as_str()) {
            score -= SENTIMENT_STEP;
        }
    }
    score.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_at_start_with_positive_context() {
        let analysis = analyze(
            "Acme is great, BetaCorp is okay",
            "Acme",
            &["BetaCorp".to_string()],
        );
        assert!(analysis.mentioned);
        assert_eq!(analysis.position, 0);
        assert_eq!(analysis.mention_count, 1);
        assert_eq!(analysis.competitor_mentions.len(), 1);
        assert_eq!(analysis.competitor_mentions[0].name, "BetaCorp");
        assert_eq!(analysis.competitor_mentions[0].count, 1);
        assert!(
            analysis.sentiment > 0.0,
            "expected positive sentiment, got {}",
            analysis.sentiment
        );
    }

    #[test]
    fn unmentioned_brand_is_neutral_regardless_of_competitors() {
        let analysis = analyze(
            "BetaCorp is terrible and everyone should avoid it",
            "Acme",
            &["BetaCorp".to_string()],
        );
        assert!(!analysis.mentioned);
        assert_eq!(analysis.position, -1);
        assert_eq!(analysis.sentiment, 0.0);
        assert_eq!(analysis.competitor_mentions.len(), 1);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let analysis = analyze("I like ACME and acme alike", "Acme", &[]);
        assert!(analysis.mentioned);
        assert_eq!(analysis.mention_count, 2);
        assert_eq!(analysis.position, 7);
    }

    #[test]
    fn competitor_position_is_first_occurrence() {
        let analysis = analyze(
            "I recommend Acme for reliability. BetaCorp is a decent alternative.",
            "Acme",
            &["BetaCorp".to_string()],
        );
        assert_eq!(analysis.position, 12);
        assert_eq!(analysis.competitor_mentions[0].first_position, 34);
        assert!(
            analysis.position < i64::try_from(analysis.competitor_mentions[0].first_position).expect("fits"),
            "brand should precede competitor"
        );
        assert!(analysis.sentiment > 0.0);
    }

    #[test]
    fn unmentioned_competitors_are_filtered_out() {
        let analysis = analyze(
            "Acme works fine",
            "Acme",
            &["BetaCorp".to_string(), "GammaSoft".to_string()],
        );
        assert!(analysis.competitor_mentions.is_empty());
    }

    #[test]
    fn negative_context_yields_negative_sentiment() {
        let analysis = analyze("Acme is slow, buggy, and the worst option here", "Acme", &[]);
        assert!(
            analysis.sentiment < 0.0,
            "expected negative sentiment, got {}",
            analysis.sentiment
        );
    }

    #[test]
    fn sentiment_is_clamped() {
        let text = "Acme best excellent great good leading love popular powerful recommend";
        let analysis = analyze(text, "Acme", &[]);
        assert!((analysis.sentiment - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn keywords_outside_window_do_not_count() {
        let padding = "x".repeat(150);
        let text = format!("terrible {padding} Acme {padding} terrible");
        let analysis = analyze(&text, "Acme", &[]);
        assert_eq!(analysis.sentiment, 0.0);
    }

    #[test]
    fn empty_brand_name_never_matches() {
        let analysis = analyze("some text", "", &[]);
        assert!(!analysis.mentioned);
        assert_eq!(analysis.position, -1);
    }

    #[test]
    fn overlapping_occurrences_are_all_counted() {
        let analysis = analyze("aaa", "aa", &[]);
        assert_eq!(analysis.mention_count, 2);
    }
}
