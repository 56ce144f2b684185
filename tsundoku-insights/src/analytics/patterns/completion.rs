//! Completion Distribution Identifier
//!
//! Summarizes the whole library as four mutually exclusive percentages
//! (completed, reading, dropped, plan to read). Fixed confidence 0.95:
//! this is a near-complete statistical summary, not a hypothesis. An
//! empty library produces no observation.

use crate::analytics::engine::{AnalyticsContext, PatternIdentifier};
use crate::analytics::policy;
use crate::db::CompletionDistribution;
use crate::error::Result;
use crate::types::{PatternObservation, PatternType};

/// Identifier for the library-wide completion distribution.
pub struct CompletionDistributionIdentifier;

impl CompletionDistributionIdentifier {
    /// Create a new identifier.
    pub fn new() -> Self {
        Self
    }

    /// Map the status distribution onto at most one observation.
    fn observation_from_distribution(dist: &CompletionDistribution) -> Option<PatternObservation> {
        if dist.total == 0 {
            return None;
        }

        let pct = |count: i64| count as f64 / dist.total as f64 * 100.0;
        let value = format!(
            "{:.1}% completed, {:.1}% reading, {:.1}% dropped, {:.1}% plan to read",
            pct(dist.completed),
            pct(dist.reading),
            pct(dist.dropped),
            pct(dist.plan_to_read)
        );

        Some(PatternObservation {
            pattern_type: PatternType::CompletionPattern,
            name: "library_completion".to_string(),
            value,
            frequency: dist.total,
            confidence: policy::COMPLETION_CONFIDENCE,
            metadata: serde_json::json!({
                "total": dist.total,
                "completed": dist.completed,
                "reading": dist.reading,
                "dropped": dist.dropped,
                "plan_to_read": dist.plan_to_read,
            }),
        })
    }
}

impl Default for CompletionDistributionIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternIdentifier for CompletionDistributionIdentifier {
    fn name(&self) -> &str {
        "completion.distribution"
    }

    fn identify(&self, ctx: &AnalyticsContext) -> Result<Vec<PatternObservation>> {
        let dist = ctx.db.completion_distribution()?;
        Ok(Self::observation_from_distribution(&dist)
            .into_iter()
            .collect())
    }
}
