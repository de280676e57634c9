//! Share-of-voice entity handling: corpus building, entity categorization,
//! and post-categorization merging.
//!
//! The LLM extraction call itself lives in `aeomon-report`; this module holds
//! the deterministic pieces around it.

use serde::{Deserialize, Serialize};

/// Character budget for the concatenated answer corpus sent to the extractor.
pub const SOV_CORPUS_BUDGET: usize = 12_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SovCategory {
    Brand,
    Competitor,
    Other,
}

/// A company/product entity extracted from the answer corpus, with the count
/// of distinct responses mentioning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SovEntity {
    pub name: String,
    pub mentions: u32,
    pub category: SovCategory,
}

/// Stored share-of-voice summary for a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SovSummary {
    pub entities: Vec<SovEntity>,
    pub total_mentions: u32,
}

/// Concatenate answer texts into one corpus, truncated to the character
/// budget. Texts are separated by blank lines; a text that would cross the
/// budget is cut mid-text rather than dropped.
#[must_use]
pub fn build_sov_corpus(texts: &[String]) -> String {
    let mut corpus = String::new();
    for text in texts {
        if corpus.len() >= SOV_CORPUS_BUDGET {
            break;
        }
        if !corpus.is_empty() {
            corpus.push_str("\n\n");
        }
        let remaining = SOV_CORPUS_BUDGET.saturating_sub(corpus.len());
        if text.len() <= remaining {
            corpus.push_str(text);
        } else {
            let cut: String = text.chars().take(remaining).collect();
            corpus.push_str(&cut);
        }
    }
    corpus
}

/// Categorize an extracted entity name against the known brand and
/// competitor names by case-insensitive containment in either direction.
#[must_use]
pub fn categorize_entity(name: &str, brand: &str, competitors: &[String]) -> SovCategory {
    if fuzzy_match(name, brand) {
        return SovCategory::Brand;
    }
    if competitors.iter().any(|c| fuzzy_match(name, c)) {
        return SovCategory::Competitor;
    }
    SovCategory::Other
}

fn fuzzy_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Merge duplicate entities (case-insensitive on name) after categorization.
///
/// Counts are summed; the first-seen spelling wins; category precedence is
/// brand > competitor > other so a duplicate can only strengthen an entity's
/// classification.
#[must_use]
pub fn merge_entities(entities: Vec<SovEntity>) -> Vec<SovEntity> {
    let mut merged: Vec<SovEntity> = Vec::new();
    for entity in entities {
        let key = entity.name.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if let Some(existing) = merged
            .iter_mut()
            .find(|e| e.name.trim().to_lowercase() == key)
        {
            existing.mentions += entity.mentions;
            existing.category = stronger(existing.category, entity.category);
        } else {
            merged.push(entity);
        }
    }
    merged.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.name.cmp(&b.name)));
    merged
}

fn stronger(a: SovCategory, b: SovCategory) -> SovCategory {
    let weight = |c: SovCategory| match c {
        SovCategory::Brand => 2,
        SovCategory::Competitor => 1,
        SovCategory::Other => 0,
    };
    if weight(b) > weight(a) {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_joins_with_blank_lines() {
        let corpus = build_sov_corpus(&["first".to_string(), "second".to_string()]);
        assert_eq!(corpus, "first\n\nsecond");
    }

    #[test]
    fn corpus_respects_budget() {
        let texts = vec!["a".repeat(9_000), "b".repeat(9_000)];
        let corpus = build_sov_corpus(&texts);
        assert!(corpus.len() <= SOV_CORPUS_BUDGET);
        assert!(corpus.contains('b'), "second text should be partially kept");
    }

    #[test]
    fn categorize_exact_brand_match() {
        assert_eq!(categorize_entity("Acme", "Acme", &[]), SovCategory::Brand);
    }

    #[test]
    fn categorize_is_fuzzy_both_directions() {
        assert_eq!(
            categorize_entity("Acme Analytics", "Acme", &[]),
            SovCategory::Brand
        );
        assert_eq!(
            categorize_entity("Beta", "Acme", &["BetaCorp".to_string()]),
            SovCategory::Competitor
        );
    }

    #[test]
    fn categorize_unknown_is_other() {
        assert_eq!(
            categorize_entity("GammaSoft", "Acme", &["BetaCorp".to_string()]),
            SovCategory::Other
        );
    }

    #[test]
    fn merge_sums_counts_case_insensitively() {
        let merged = merge_entities(vec![
            SovEntity {
                name: "Acme".to_string(),
                mentions: 3,
                category: SovCategory::Brand,
            },
            SovEntity {
                name: "acme".to_string(),
                mentions: 2,
                category: SovCategory::Other,
            },
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].mentions, 5);
        assert_eq!(merged[0].category, SovCategory::Brand);
        assert_eq!(merged[0].name, "Acme");
    }

    #[test]
    fn merge_orders_by_mentions_descending() {
        let merged = merge_entities(vec![
            SovEntity {
                name: "Small".to_string(),
                mentions: 1,
                category: SovCategory::Other,
            },
            SovEntity {
                name: "Big".to_string(),
                mentions: 9,
                category: SovCategory::Other,
            },
        ]);
        assert_eq!(merged[0].name, "Big");
    }

    #[test]
    fn merge_drops_blank_names() {
        let merged = merge_entities(vec![SovEntity {
            name: "   ".to_string(),
            mentions: 4,
            category: SovCategory::Other,
        }]);
        assert!(merged.is_empty());
    }
}
