//! Quality Analyzer
//!
//! Flags novels that sit in readers' libraries but average below the
//! quality threshold, one candidate per novel. Priority rises with the
//! novel's own drop rate.
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | rating < 3.5 and at least one library entry | candidate emitted |
//! | drop rate > 50% | High priority |
//! | otherwise | Medium priority |
//!
//! Confidence: fixed 0.85.

use crate::analytics::engine::{AnalyticsContext, RecommendationAnalyzer};
use crate::analytics::policy;
use crate::db::LowRatedNovelRow;
use crate::error::Result;
use crate::types::{NewRecommendation, Priority, RecommendationType};

/// Analyzer that proposes quality review for poorly rated novels.
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Per-novel drop percentage; 0 when the novel is in no library.
    fn drop_rate(row: &LowRatedNovelRow) -> f64 {
        if row.total_in_library <= 0 {
            return 0.0;
        }
        row.dropped_count as f64 / row.total_in_library as f64 * 100.0
    }

    /// Map low-rated novel aggregates onto candidate recommendations.
    fn candidates_from_rows(rows: &[LowRatedNovelRow]) -> Vec<NewRecommendation> {
        rows.iter()
            .map(|row| {
                let drop_rate = Self::drop_rate(row);
                let priority = if drop_rate > policy::QUALITY_HIGH_DROP_RATE {
                    Priority::High
                } else {
                    Priority::Medium
                };
                NewRecommendation {
                    rec_type: RecommendationType::Quality,
                    title: format!("Review quality of \"{}\"", row.title),
                    description: format!(
                        "\"{}\" averages {:.1} and {} of {} readers holding it have \
                         dropped it ({:.1}%). Worth an editorial pass or a translation \
                         quality check.",
                        row.title, row.rating, row.dropped_count, row.total_in_library, drop_rate
                    ),
                    priority,
                    confidence: policy::QUALITY_CONFIDENCE,
                    metadata: serde_json::json!({
                        "novel_id": row.novel_id,
                        "rating": row.rating,
                        "dropped_count": row.dropped_count,
                        "total_in_library": row.total_in_library,
                        "drop_rate": drop_rate,
                    }),
                }
            })
            .collect()
    }
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationAnalyzer for QualityAnalyzer {
    fn name(&self) -> &str {
        "quality.low_rated"
    }

    fn analyze(&self, ctx: &AnalyticsContext) -> Result<Vec<NewRecommendation>> {
        let rows = ctx.db.low_rated_novels(policy::QUALITY_MAX_RATING)?;
        Ok(Self::candidates_from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, rating: f64, dropped: i64, total: i64) -> LowRatedNovelRow {
        LowRatedNovelRow {
            novel_id: format!("novel-{}", title.len()),
            title: title.to_string(),
            rating,
            dropped_count: dropped,
            total_in_library: total,
        }
    }

    #[test]
    fn test_one_candidate_per_novel() {
        let candidates = QualityAnalyzer::candidates_from_rows(&[
            row("Cursed Blade", 2.1, 8, 10),
            row("Grey Harbor", 3.2, 1, 10),
        ]);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Review quality of \"Cursed Blade\"");
        assert_eq!(candidates[1].title, "Review quality of \"Grey Harbor\"");
        for c in &candidates {
            assert_eq!(c.rec_type, RecommendationType::Quality);
            assert_eq!(c.confidence, 0.85);
        }
    }

    #[test]
    fn test_priority_by_drop_rate() {
        // 80% dropped: High
        let high = QualityAnalyzer::candidates_from_rows(&[row("A", 2.0, 8, 10)]);
        assert_eq!(high[0].priority, Priority::High);

        // Exactly 50% is not strictly greater: Medium
        let medium = QualityAnalyzer::candidates_from_rows(&[row("B", 2.0, 5, 10)]);
        assert_eq!(medium[0].priority, Priority::Medium);

        // Nobody dropped it yet: Medium
        let kept = QualityAnalyzer::candidates_from_rows(&[row("C", 3.0, 0, 4)]);
        assert_eq!(kept[0].priority, Priority::Medium);
    }

    #[test]
    fn test_drop_rate_guard() {
        assert_eq!(QualityAnalyzer::drop_rate(&row("A", 2.0, 0, 0)), 0.0);
        assert_eq!(QualityAnalyzer::drop_rate(&row("B", 2.0, 3, 4)), 75.0);
    }
}
