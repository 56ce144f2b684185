//! Global Abandonment Analyzer
//!
//! Watches the overall drop rate across every library entry. Strictly
//! above 30% it proposes a retention review; above 50% the proposal is
//! High priority. Fixed confidence 0.90.

use crate::analytics::engine::{AnalyticsContext, RecommendationAnalyzer};
use crate::analytics::policy;
use crate::error::Result;
use crate::types::{NewRecommendation, Priority, RecommendationType};

/// Analyzer that raises a catalog-wide retention proposal.
pub struct AbandonmentAnalyzer;

impl AbandonmentAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Map the overall abandonment rate onto at most one candidate.
    ///
    /// The 30% trigger is strictly greater-than: exactly 30% stays quiet.
    fn candidate_for_rate(rate: f64) -> Option<NewRecommendation> {
        if rate <= policy::ABANDONMENT_TRIGGER_RATE {
            return None;
        }

        let priority = if rate > policy::ABANDONMENT_HIGH_RATE {
            Priority::High
        } else {
            Priority::Medium
        };

        Some(NewRecommendation {
            rec_type: RecommendationType::Quality,
            title: "Reduce library abandonment".to_string(),
            description: format!(
                "{:.1}% of all library entries are dropped. Review the most-dropped \
                 titles and the onboarding flow into long series.",
                rate
            ),
            priority,
            confidence: policy::ABANDONMENT_CONFIDENCE,
            metadata: serde_json::json!({"abandonment_rate": rate}),
        })
    }
}

impl Default for AbandonmentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationAnalyzer for AbandonmentAnalyzer {
    fn name(&self) -> &str {
        "retention.abandonment"
    }

    fn analyze(&self, ctx: &AnalyticsContext) -> Result<Vec<NewRecommendation>> {
        let rate = ctx.db.abandonment_rate()?;
        Ok(Self::candidate_for_rate(rate).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_is_strictly_above_30() {
        assert!(AbandonmentAnalyzer::candidate_for_rate(30.0).is_none());
        assert!(AbandonmentAnalyzer::candidate_for_rate(30.1).is_some());
        assert!(AbandonmentAnalyzer::candidate_for_rate(0.0).is_none());
    }

    #[test]
    fn test_priority_boundary_at_50() {
        let medium = AbandonmentAnalyzer::candidate_for_rate(50.0).unwrap();
        assert_eq!(medium.priority, Priority::Medium);

        let high = AbandonmentAnalyzer::candidate_for_rate(50.1).unwrap();
        assert_eq!(high.priority, Priority::High);
    }

    #[test]
    fn test_candidate_shape() {
        let c = AbandonmentAnalyzer::candidate_for_rate(42.5).unwrap();
        assert_eq!(c.rec_type, RecommendationType::Quality);
        assert_eq!(c.title, "Reduce library abandonment");
        assert_eq!(c.confidence, 0.90);
        assert!(c.description.contains("42.5%"));
        assert_eq!(c.metadata["abandonment_rate"], 42.5);
    }
}
