//! Recommendation policy table
//!
//! Every priority threshold and confidence formula used by the analyzers
//! lives here, as one declarative table. The values are fixed business
//! rules: changing any of them changes the recommendations produced for
//! identical catalog data, so they are pinned by tests and must not drift.

use crate::types::Priority;

/// Cap applied to every computed confidence. Analyzers never emit above this.
pub const CONFIDENCE_CAP: f64 = 0.95;

/// Priority tiers keyed on a demand ratio: strictly above `high` is High,
/// strictly above `medium` is Medium, anything else Low.
#[derive(Debug, Clone, Copy)]
pub struct RatioTiers {
    pub high: f64,
    pub medium: f64,
}

impl RatioTiers {
    /// Map a ratio onto its priority tier.
    pub fn priority_for(&self, ratio: f64) -> Priority {
        if ratio > self.high {
            Priority::High
        } else if ratio > self.medium {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

// ============================================
// Genre demand
// ============================================

/// Genres qualify only while undersupplied: fewer novels than this.
pub const GENRE_MAX_NOVEL_COUNT: i64 = 10;
/// Reads-per-novel tiers for genre demand.
pub const GENRE_DEMAND_TIERS: RatioTiers = RatioTiers {
    high: 10.0,
    medium: 5.0,
};

/// Genre confidence: min(0.95, 0.5 + ratio/100).
pub fn genre_confidence(ratio: f64) -> f64 {
    (0.5 + ratio / 100.0).min(CONFIDENCE_CAP)
}

// ============================================
// Author engagement
// ============================================

/// Authors qualify with strictly more reads than this.
pub const AUTHOR_MIN_READS: i64 = 5;
/// Authors qualify at or above this average rating.
pub const AUTHOR_MIN_RATING: f64 = 3.5;
/// At or above this average rating the proposal is High priority.
pub const AUTHOR_HIGH_RATING: f64 = 4.0;

/// Author confidence: min(0.95, 0.6 + avg_rating/10).
pub fn author_confidence(avg_rating: f64) -> f64 {
    (0.6 + avg_rating / 10.0).min(CONFIDENCE_CAP)
}

// ============================================
// Quality / abandonment
// ============================================

/// Novels averaging below this rating are flagged for quality review.
pub const QUALITY_MAX_RATING: f64 = 3.5;
/// Above this per-novel drop percentage the proposal is High priority.
pub const QUALITY_HIGH_DROP_RATE: f64 = 50.0;
/// Fixed confidence for quality proposals.
pub const QUALITY_CONFIDENCE: f64 = 0.85;

// ============================================
// Length preference
// ============================================

/// Fixed confidence for length-preference proposals.
pub const LENGTH_CONFIDENCE: f64 = 0.75;

// ============================================
// Global abandonment
// ============================================

/// Strictly above this overall abandonment percentage a proposal is emitted.
pub const ABANDONMENT_TRIGGER_RATE: f64 = 30.0;
/// Above this percentage the proposal is High priority.
pub const ABANDONMENT_HIGH_RATE: f64 = 50.0;
/// Fixed confidence for global-abandonment proposals.
pub const ABANDONMENT_CONFIDENCE: f64 = 0.90;

// ============================================
// Tag demand
// ============================================

/// Tags qualify with at least this many votes.
pub const TAG_MIN_VOTES: i64 = 5;
/// Tags qualify with at most this many novels.
pub const TAG_MAX_NOVEL_COUNT: i64 = 2;
/// Votes-per-novel tiers for tag demand.
pub const TAG_DEMAND_TIERS: RatioTiers = RatioTiers {
    high: 5.0,
    medium: 2.0,
};

/// Tag confidence: min(0.95, 0.5 + votes * 0.05).
///
/// The raw formula exceeds 1.0 from 10 votes up; the cap absorbs that,
/// flattening differences between high-vote tags. Kept as-is.
pub fn tag_confidence(total_votes: i64) -> f64 {
    (0.5 + total_votes as f64 * 0.05).min(CONFIDENCE_CAP)
}

// ============================================
// Patterns
// ============================================

/// Fixed confidence for the content-preference pattern (a hypothesis).
pub const CONTENT_PREFERENCE_CONFIDENCE: f64 = 0.85;
/// Fixed confidence for the completion-distribution pattern (a near-complete
/// statistical summary).
pub const COMPLETION_CONFIDENCE: f64 = 0.95;

/// Demand ratio with a guarded denominator: with nothing on the supply side
/// the raw demand stands in for the ratio, ranking maximal.
pub fn demand_ratio(demand: i64, supply: i64) -> f64 {
    if supply <= 0 {
        demand as f64
    } else {
        demand as f64 / supply as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_tiers_are_strict() {
        let tiers = RatioTiers {
            high: 10.0,
            medium: 5.0,
        };
        assert_eq!(tiers.priority_for(10.0), Priority::Medium);
        assert_eq!(tiers.priority_for(10.1), Priority::High);
        assert_eq!(tiers.priority_for(5.0), Priority::Low);
        assert_eq!(tiers.priority_for(5.1), Priority::Medium);
        assert_eq!(tiers.priority_for(0.0), Priority::Low);
    }

    #[test]
    fn test_genre_confidence() {
        // Isekai scenario: 120 reads over 8 novels
        let ratio = demand_ratio(120, 8);
        assert_eq!(ratio, 15.0);
        assert_eq!(GENRE_DEMAND_TIERS.priority_for(ratio), Priority::High);
        assert!((genre_confidence(ratio) - 0.65).abs() < 1e-9);

        // Cap applies past ratio 45
        assert_eq!(genre_confidence(60.0), CONFIDENCE_CAP);
    }

    #[test]
    fn test_author_confidence() {
        assert!((author_confidence(3.5) - 0.95).abs() < 1e-9);
        assert!((author_confidence(3.0) - 0.90).abs() < 1e-9);
        // Raw value tops the cap at 3.5 and above
        assert_eq!(author_confidence(5.0), CONFIDENCE_CAP);
    }

    #[test]
    fn test_tag_confidence_cap_absorbs_overflow() {
        // Time Travel scenario: 12 votes -> raw 1.1, capped
        assert_eq!(tag_confidence(12), CONFIDENCE_CAP);
        // Below the cap the formula is linear
        assert!((tag_confidence(5) - 0.75).abs() < 1e-9);
        assert!((tag_confidence(8) - 0.90).abs() < 1e-9);
    }

    #[test]
    fn test_demand_ratio_guards_zero_supply() {
        assert_eq!(demand_ratio(12, 2), 6.0);
        assert_eq!(demand_ratio(7, 0), 7.0);
        assert_eq!(demand_ratio(0, 0), 0.0);
    }

    #[test]
    fn test_all_fixed_confidences_within_bounds() {
        for c in [
            QUALITY_CONFIDENCE,
            LENGTH_CONFIDENCE,
            ABANDONMENT_CONFIDENCE,
            CONTENT_PREFERENCE_CONFIDENCE,
            COMPLETION_CONFIDENCE,
        ] {
            assert!(c > 0.0 && c <= CONFIDENCE_CAP);
        }
    }
}
