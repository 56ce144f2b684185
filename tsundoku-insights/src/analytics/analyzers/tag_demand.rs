//! Tag Demand Analyzer
//!
//! Flags tags readers vote for heavily while the catalog offers almost
//! nothing under them. Kept outside the core analyzer sequence: its
//! trigger keys on reader votes rather than reading activity. Ratio is
//! votes per tagged novel.
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | `total_votes >= 5` and `novel_count <= 2` | candidate emitted |
//! | ratio > 5 | High priority |
//! | ratio > 2 | Medium priority |
//! | otherwise | Low priority |
//!
//! Confidence: `min(0.95, 0.5 + votes * 0.05)`.

use crate::analytics::engine::{AnalyticsContext, RecommendationAnalyzer};
use crate::analytics::policy;
use crate::db::TagDemandRow;
use crate::error::Result;
use crate::types::{NewRecommendation, RecommendationType};

/// Analyzer that proposes sourcing novels for high-vote, low-supply tags.
pub struct TagDemandAnalyzer;

impl TagDemandAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Map tag aggregates onto candidate recommendations.
    fn candidates_from_rows(rows: &[TagDemandRow]) -> Vec<NewRecommendation> {
        rows.iter()
            .filter(|row| {
                row.total_votes >= policy::TAG_MIN_VOTES
                    && row.novel_count <= policy::TAG_MAX_NOVEL_COUNT
            })
            .map(|row| {
                let ratio = policy::demand_ratio(row.total_votes, row.novel_count);
                NewRecommendation {
                    rec_type: RecommendationType::TagDemand,
                    title: format!("Source novels tagged \"{}\"", row.tag),
                    description: format!(
                        "Readers cast {} votes for \"{}\" but the catalog holds only \
                         {} novels under it. Sourcing more would serve a demonstrated \
                         niche.",
                        row.total_votes, row.tag, row.novel_count
                    ),
                    priority: policy::TAG_DEMAND_TIERS.priority_for(ratio),
                    confidence: policy::tag_confidence(row.total_votes),
                    metadata: serde_json::json!({
                        "tag": row.tag,
                        "total_votes": row.total_votes,
                        "novel_count": row.novel_count,
                        "ratio": ratio,
                    }),
                }
            })
            .collect()
    }
}

impl Default for TagDemandAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationAnalyzer for TagDemandAnalyzer {
    fn name(&self) -> &str {
        "demand.tag"
    }

    fn analyze(&self, ctx: &AnalyticsContext) -> Result<Vec<NewRecommendation>> {
        let rows = ctx.db.tag_demand()?;
        Ok(Self::candidates_from_rows(&rows))
    }
}
