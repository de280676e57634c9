//! Rank-position and sentiment-bucket aggregation over a report's results.

/// Sentiment thresholds for bucketing a mentioned result.
const POSITIVE_THRESHOLD: f64 = 0.1;
const NEGATIVE_THRESHOLD: f64 = -0.1;

/// Per-prompt mention facts fed into the aggregator, as stored on a
/// `prompt_results` row.
#[derive(Debug, Clone)]
pub struct ResultMentions {
    pub brand_mentioned: bool,
    /// First-occurrence character offset, `-1` when unmentioned.
    pub brand_position: i64,
    pub sentiment: f64,
    /// First positions of each competitor with at least one hit.
    pub competitor_positions: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SentimentBuckets {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankSentimentSummary {
    /// Number of results where the brand was mentioned.
    pub total_mentions: u32,
    /// Average 1-based rank of the brand among (brand ∪ mentioned
    /// competitors) ordered by first position. `None` when no result has
    /// both a brand position and at least one competitor position.
    pub average_position: Option<f64>,
    pub sentiment: SentimentBuckets,
}

/// Aggregate mention rank and sentiment buckets across a report's results.
///
/// Rank is computed only for results where the brand and at least one
/// competitor both have valid first positions; the brand's rank is one plus
/// the number of competitors mentioned strictly before it (a tie does not
/// push the brand down).
#[must_use]
pub fn aggregate_rank_sentiment(results: &[ResultMentions]) -> RankSentimentSummary {
    let mut total_mentions = 0u32;
    let mut buckets = SentimentBuckets::default();
    let mut rank_sum = 0u64;
    let mut rank_count = 0u32;

    for result in results {
        if !result.brand_mentioned {
            continue;
        }
        total_mentions += 1;

        if result.sentiment > POSITIVE_THRESHOLD {
            buckets.positive += 1;
        } else if result.sentiment < NEGATIVE_THRESHOLD {
            buckets.negative += 1;
        } else {
            buckets.neutral += 1;
        }

        if result.brand_position < 0 {
            continue;
        }
        let valid_competitors: Vec<i64> = result
            .competitor_positions
            .iter()
            .copied()
            .filter(|&p| p >= 0)
            .collect();
        if valid_competitors.is_empty() {
            continue;
        }

        let ahead = valid_competitors
            .iter()
            .filter(|&&p| p < result.brand_position)
            .count();
        rank_sum += ahead as u64 + 1;
        rank_count += 1;
    }

    let average_position = if rank_count == 0 {
        None
    } else {
        #[allow(clippy::cast_precision_loss)]
        Some(rank_sum as f64 / f64::from(rank_count))
    };

    RankSentimentSummary {
        total_mentions,
        average_position,
        sentiment: buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentioned(position: i64, sentiment: f64, competitors: Vec<i64>) -> ResultMentions {
        ResultMentions {
            brand_mentioned: true,
            brand_position: position,
            sentiment,
            competitor_positions: competitors,
        }
    }

    #[test]
    fn empty_results_have_no_rank() {
        let summary = aggregate_rank_sentiment(&[]);
        assert_eq!(summary.total_mentions, 0);
        assert_eq!(summary.average_position, None);
        assert_eq!(summary.sentiment, SentimentBuckets::default());
    }

    #[test]
    fn brand_before_competitor_ranks_first() {
        let summary = aggregate_rank_sentiment(&[mentioned(17, 0.6, vec![50])]);
        assert_eq!(summary.total_mentions, 1);
        assert_eq!(summary.average_position, Some(1.0));
        assert_eq!(summary.sentiment.positive, 1);
    }

    #[test]
    fn brand_after_two_competitors_ranks_third() {
        let summary = aggregate_rank_sentiment(&[mentioned(90, 0.0, vec![10, 40])]);
        assert_eq!(summary.average_position, Some(3.0));
        assert_eq!(summary.sentiment.neutral, 1);
    }

    #[test]
    fn ranks_average_across_prompts() {
        let summary = aggregate_rank_sentiment(&[
            mentioned(0, 0.3, vec![20]),
            mentioned(80, -0.5, vec![5, 10]),
        ]);
        // Ranks 1 and 3 → average 2.0.
        assert_eq!(summary.average_position, Some(2.0));
        assert_eq!(summary.sentiment.positive, 1);
        assert_eq!(summary.sentiment.negative, 1);
    }

    #[test]
    fn results_without_competitors_count_mentions_but_not_rank() {
        let summary = aggregate_rank_sentiment(&[mentioned(3, 0.05, vec![])]);
        assert_eq!(summary.total_mentions, 1);
        assert_eq!(summary.average_position, None);
        assert_eq!(summary.sentiment.neutral, 1);
    }

    #[test]
    fn unmentioned_results_are_ignored_entirely() {
        let summary = aggregate_rank_sentiment(&[ResultMentions {
            brand_mentioned: false,
            brand_position: -1,
            sentiment: 0.0,
            competitor_positions: vec![0],
        }]);
        assert_eq!(summary.total_mentions, 0);
        assert_eq!(summary.average_position, None);
    }

    #[test]
    fn tie_with_competitor_does_not_push_brand_down() {
        let summary = aggregate_rank_sentiment(&[mentioned(10, 0.0, vec![10])]);
        assert_eq!(summary.average_position, Some(1.0));
    }

    #[test]
    fn boundary_sentiment_is_neutral() {
        let summary =
            aggregate_rank_sentiment(&[mentioned(0, 0.1, vec![]), mentioned(0, -0.1, vec![])]);
        assert_eq!(summary.sentiment.neutral, 2);
        assert_eq!(summary.sentiment.positive, 0);
        assert_eq!(summary.sentiment.negative, 0);
    }
}
