//! Length Preference Analyzer
//!
//! Reads are bucketed by chapter count (short, medium, long); the bucket
//! drawing the most reads becomes an acquisition hint. One candidate at
//! most, fixed Medium priority, fixed confidence 0.75.

use crate::analytics::engine::{AnalyticsContext, RecommendationAnalyzer};
use crate::analytics::policy;
use crate::db::LengthBucketRow;
use crate::error::Result;
use crate::types::{NewRecommendation, Priority, RecommendationType};

/// Analyzer that proposes acquisitions matching the preferred novel length.
pub struct LengthPreferenceAnalyzer;

impl LengthPreferenceAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Map bucket aggregates onto at most one candidate recommendation.
    ///
    /// Rows arrive sorted by read count descending; the first bucket with
    /// any reads wins. No reads anywhere, no candidate.
    fn candidates_from_rows(rows: &[LengthBucketRow]) -> Vec<NewRecommendation> {
        let Some(top) = rows.iter().find(|row| row.read_count > 0) else {
            return vec![];
        };

        vec![NewRecommendation {
            rec_type: RecommendationType::Length,
            title: format!("Prioritize {}-length acquisitions", top.category),
            description: format!(
                "Readers favor {} novels: {} reads and {} completions across \
                 {} titles in that range. New acquisitions of similar length \
                 are the safest fit.",
                top.category, top.read_count, top.completed_count, top.novel_count
            ),
            priority: Priority::Medium,
            confidence: policy::LENGTH_CONFIDENCE,
            metadata: serde_json::json!({
                "category": top.category,
                "read_count": top.read_count,
                "completed_count": top.completed_count,
                "novel_count": top.novel_count,
            }),
        }]
    }
}

impl Default for LengthPreferenceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationAnalyzer for LengthPreferenceAnalyzer {
    fn name(&self) -> &str {
        "preference.length"
    }

    fn analyze(&self, ctx: &AnalyticsContext) -> Result<Vec<NewRecommendation>> {
        let rows = ctx.db.chapter_length_buckets()?;
        Ok(Self::candidates_from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, novel_count: i64, read_count: i64, completed: i64) -> LengthBucketRow {
        LengthBucketRow {
            category: category.to_string(),
            novel_count,
            read_count,
            completed_count: completed,
        }
    }

    #[test]
    fn test_single_candidate_for_top_bucket() {
        let candidates = LengthPreferenceAnalyzer::candidates_from_rows(&[
            row("medium", 12, 340, 25),
            row("short", 30, 120, 40),
            row("long", 4, 80, 2),
        ]);

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.rec_type, RecommendationType::Length);
        assert_eq!(c.title, "Prioritize medium-length acquisitions");
        assert_eq!(c.priority, Priority::Medium);
        assert_eq!(c.confidence, 0.75);
        assert_eq!(c.metadata["category"], "medium");
    }

    #[test]
    fn test_no_reads_no_candidate() {
        let candidates = LengthPreferenceAnalyzer::candidates_from_rows(&[
            row("short", 10, 0, 0),
            row("medium", 5, 0, 0),
        ]);
        assert!(candidates.is_empty());

        assert!(LengthPreferenceAnalyzer::candidates_from_rows(&[]).is_empty());
    }

    #[test]
    fn test_skips_zero_read_leader() {
        // A zero-read bucket ahead of the data (empty catalog slice) is
        // passed over for the first bucket with actual reads
        let candidates = LengthPreferenceAnalyzer::candidates_from_rows(&[
            row("long", 9, 0, 0),
            row("short", 3, 15, 6),
        ]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].metadata["category"], "short");
    }
}
