//! Author Engagement Analyzer
//!
//! Flags authors whose existing work is both read and well rated, as
//! candidates for promotion or commissioning.
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | `read_count > 5` and `avg_rating >= 3.5` | candidate emitted |
//! | `avg_rating >= 4.0` | High priority |
//! | otherwise | Medium priority |
//!
//! Confidence: `min(0.95, 0.6 + avg_rating/10)`.

use crate::analytics::engine::{AnalyticsContext, RecommendationAnalyzer};
use crate::analytics::policy;
use crate::db::AuthorEngagementRow;
use crate::error::Result;
use crate::types::{NewRecommendation, Priority, RecommendationType};

/// Analyzer that proposes promoting high-engagement authors.
pub struct AuthorEngagementAnalyzer;

impl AuthorEngagementAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Map author aggregates onto candidate recommendations.
    fn candidates_from_rows(rows: &[AuthorEngagementRow]) -> Vec<NewRecommendation> {
        rows.iter()
            .filter(|row| {
                row.read_count > policy::AUTHOR_MIN_READS
                    && row.avg_rating >= policy::AUTHOR_MIN_RATING
            })
            .map(|row| {
                let priority = if row.avg_rating >= policy::AUTHOR_HIGH_RATING {
                    Priority::High
                } else {
                    Priority::Medium
                };
                NewRecommendation {
                    rec_type: RecommendationType::Author,
                    title: format!("Promote works by {}", row.author),
                    description: format!(
                        "{} holds a {:.1} average rating with {} reads from {} readers \
                         over {} novels. Featuring this author should convert well.",
                        row.author,
                        row.avg_rating,
                        row.read_count,
                        row.unique_readers,
                        row.novel_count
                    ),
                    priority,
                    confidence: policy::author_confidence(row.avg_rating),
                    metadata: serde_json::json!({
                        "author": row.author,
                        "read_count": row.read_count,
                        "avg_rating": row.avg_rating,
                        "unique_readers": row.unique_readers,
                        "novel_count": row.novel_count,
                    }),
                }
            })
            .collect()
    }
}

impl Default for AuthorEngagementAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationAnalyzer for AuthorEngagementAnalyzer {
    fn name(&self) -> &str {
        "engagement.author"
    }

    fn analyze(&self, ctx: &AnalyticsContext) -> Result<Vec<NewRecommendation>> {
        let rows = ctx.db.author_engagement()?;
        Ok(Self::candidates_from_rows(&rows))
    }
}
