//! The 0–100 visibility score.
//!
//! `score = 40·mention_rate + 30·position_score + 30·mention_dominance`.
//! The 40/30/30 split is a documented contract with downstream consumers;
//! changing the weights is a breaking change, not a tuning opportunity.

/// Character gap at which the trailing-position score bottoms out.
const GAP_SATURATION: i64 = 2_000;

/// Floor of the per-result position score when the brand trails.
const POSITION_FLOOR: f64 = 0.3;

/// Per-result score when brand and competitor first appear at the same offset.
const TIE_SCORE: f64 = 0.7;

/// Visibility facts for one `ok` prompt result.
#[derive(Debug, Clone)]
pub struct ResultVisibility {
    pub brand_mentioned: bool,
    /// First-occurrence character offset, `-1` when unmentioned.
    pub brand_position: i64,
    pub brand_mention_count: u32,
    /// Earliest competitor first-position, if any competitor was mentioned.
    pub earliest_competitor_position: Option<i64>,
    /// Sum of all competitor occurrence counts in this result.
    pub competitor_mention_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityBreakdown {
    pub mention_rate: f64,
    pub position_score: f64,
    pub mention_dominance: f64,
    /// `40·rate + 30·position + 30·dominance`, in `[0, 100]`.
    pub score: f64,
}

/// Compute the visibility score over all `ok` results for a report.
///
/// An empty input (no `ok` results) scores zero across the board.
#[must_use]
pub fn visibility_score(results: &[ResultVisibility]) -> VisibilityBreakdown {
    if results.is_empty() {
        return VisibilityBreakdown {
            mention_rate: 0.0,
            position_score: 0.0,
            mention_dominance: 0.0,
            score: 0.0,
        };
    }

    let mentioned = results.iter().filter(|r| r.brand_mentioned).count();
    #[allow(clippy::cast_precision_loss)]
    let mention_rate = mentioned as f64 / results.len() as f64;

    let mut position_sum = 0.0_f64;
    let mut position_count = 0u32;
    for result in results {
        if !result.brand_mentioned || result.brand_position < 0 {
            continue;
        }
        position_sum += result_position_score(result);
        position_count += 1;
    }
    let position_score = if position_count == 0 {
        0.0
    } else {
        position_sum / f64::from(position_count)
    };

    let brand_total: u32 = results.iter().map(|r| r.brand_mention_count).sum();
    let competitor_total: u32 = results.iter().map(|r| r.competitor_mention_count).sum();
    let denominator = brand_total + competitor_total;
    let mention_dominance = if denominator == 0 {
        0.0
    } else {
        f64::from(brand_total) / f64::from(denominator)
    };

    VisibilityBreakdown {
        mention_rate,
        position_score,
        mention_dominance,
        score: 40.0 * mention_rate + 30.0 * position_score + 30.0 * mention_dominance,
    }
}

/// Per-result position score: 1.0 when the brand leads (or no competitor
/// appears), 0.7 on a tie, otherwise decaying linearly with the character
/// gap down to a 0.3 floor.
fn result_position_score(result: &ResultVisibility) -> f64 {
    let Some(competitor) = result.earliest_competitor_position else {
        return 1.0;
    };
    if result.brand_position < competitor {
        return 1.0;
    }
    if result.brand_position == competitor {
        return TIE_SCORE;
    }
    let gap = (result.brand_position - competitor).min(GAP_SATURATION);
    #[allow(clippy::cast_precision_loss)]
    let decay = gap as f64 / GAP_SATURATION as f64 * 0.4;
    (TIE_SCORE - decay).max(POSITION_FLOOR)
}
