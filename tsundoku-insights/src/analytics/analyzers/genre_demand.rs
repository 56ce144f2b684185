//! Genre Demand Analyzer
//!
//! Flags genres where reading activity outpaces the catalog: readers keep
//! coming back to a genre that holds only a handful of novels. Ratio is
//! reads per novel in the genre.
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | `read_count > 0` and `novel_count < 10` | candidate emitted |
//! | ratio > 10 | High priority |
//! | ratio > 5 | Medium priority |
//! | otherwise | Low priority |
//!
//! Confidence: `min(0.95, 0.5 + ratio/100)`.

use crate::analytics::engine::{AnalyticsContext, RecommendationAnalyzer};
use crate::analytics::policy;
use crate::db::GenreDemandRow;
use crate::error::Result;
use crate::types::{NewRecommendation, RecommendationType};

/// Analyzer that proposes catalog expansion for undersupplied genres.
pub struct GenreDemandAnalyzer;

impl GenreDemandAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Map genre aggregates onto candidate recommendations.
    fn candidates_from_rows(rows: &[GenreDemandRow]) -> Vec<NewRecommendation> {
        rows.iter()
            .filter(|row| row.read_count > 0 && row.novel_count < policy::GENRE_MAX_NOVEL_COUNT)
            .map(|row| {
                let ratio = policy::demand_ratio(row.read_count, row.novel_count);
                NewRecommendation {
                    rec_type: RecommendationType::Genre,
                    title: format!("Expand the {} catalog", row.genre),
                    description: format!(
                        "{} drew {} reads from {} readers across only {} novels \
                         ({:.1} reads per novel). More titles in this genre would \
                         meet demand that already exists.",
                        row.genre, row.read_count, row.user_interest, row.novel_count, ratio
                    ),
                    priority: policy::GENRE_DEMAND_TIERS.priority_for(ratio),
                    confidence: policy::genre_confidence(ratio),
                    metadata: serde_json::json!({
                        "genre": row.genre,
                        "read_count": row.read_count,
                        "novel_count": row.novel_count,
                        "user_interest": row.user_interest,
                        "ratio": ratio,
                    }),
                }
            })
            .collect()
    }
}

impl Default for GenreDemandAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationAnalyzer for GenreDemandAnalyzer {
    fn name(&self) -> &str {
        "demand.genre"
    }

    fn analyze(&self, ctx: &AnalyticsContext) -> Result<Vec<NewRecommendation>> {
        let rows = ctx.db.genre_demand()?;
        Ok(Self::candidates_from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn row(genre: &str, novel_count: i64, read_count: i64) -> GenreDemandRow {
        GenreDemandRow {
            genre: genre.to_string(),
            novel_count,
            user_interest: read_count / 2,
            read_count,
        }
    }

    #[test]
    fn test_isekai_scenario() {
        // 120 reads over 8 novels: ratio 15, High, confidence 0.65
        let candidates = GenreDemandAnalyzer::candidates_from_rows(&[row("Isekai", 8, 120)]);

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.rec_type, RecommendationType::Genre);
        assert_eq!(c.title, "Expand the Isekai catalog");
        assert_eq!(c.priority, Priority::High);
        assert!((c.confidence - 0.65).abs() < 1e-9);
        assert_eq!(c.metadata["ratio"], 15.0);
    }

    #[test]
    fn test_requires_reads_and_undersupply() {
        // No reads: no candidate even though undersupplied
        assert!(GenreDemandAnalyzer::candidates_from_rows(&[row("Mecha", 3, 0)]).is_empty());

        // Well-supplied genre: no candidate regardless of reads
        assert!(GenreDemandAnalyzer::candidates_from_rows(&[row("Romance", 10, 500)]).is_empty());

        // Nine novels still qualifies
        assert_eq!(
            GenreDemandAnalyzer::candidates_from_rows(&[row("Horror", 9, 20)]).len(),
            1
        );
    }

    #[test]
    fn test_priority_tiers() {
        // ratio 4: Low
        let low = GenreDemandAnalyzer::candidates_from_rows(&[row("A", 5, 20)]);
        assert_eq!(low[0].priority, Priority::Low);

        // ratio 6: Medium
        let medium = GenreDemandAnalyzer::candidates_from_rows(&[row("B", 5, 30)]);
        assert_eq!(medium[0].priority, Priority::Medium);

        // ratio 12: High
        let high = GenreDemandAnalyzer::candidates_from_rows(&[row("C", 5, 60)]);
        assert_eq!(high[0].priority, Priority::High);
    }

    #[test]
    fn test_confidence_bounds() {
        // Extreme demand still caps at 0.95
        let capped = GenreDemandAnalyzer::candidates_from_rows(&[row("D", 1, 500)]);
        assert_eq!(capped[0].confidence, policy::CONFIDENCE_CAP);
    }
}
