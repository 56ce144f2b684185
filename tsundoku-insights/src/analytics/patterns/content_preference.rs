//! Content Preference Identifier
//!
//! Observes which genre currently leads reading activity. The observation
//! keeps a fixed name so each run refreshes the same row even when the
//! leading genre changes. Fixed confidence 0.85: a single top genre is a
//! hypothesis about taste, not a full summary.

use crate::analytics::engine::{AnalyticsContext, PatternIdentifier};
use crate::analytics::policy;
use crate::db::EntityReadCount;
use crate::error::Result;
use crate::types::{PatternObservation, PatternType};

/// Identifier for the catalog-wide favorite genre.
pub struct ContentPreferenceIdentifier;

impl ContentPreferenceIdentifier {
    /// Create a new identifier.
    pub fn new() -> Self {
        Self
    }

    /// Map the top-genre row onto at most one observation.
    fn observations_from_rows(rows: &[EntityReadCount]) -> Vec<PatternObservation> {
        let Some(top) = rows.first().filter(|row| row.read_count > 0) else {
            return vec![];
        };

        vec![PatternObservation {
            pattern_type: PatternType::ContentPreference,
            name: "favorite_genre".to_string(),
            value: format!(
                "{} leads reading activity with {} reads",
                top.name, top.read_count
            ),
            frequency: top.read_count,
            confidence: policy::CONTENT_PREFERENCE_CONFIDENCE,
            metadata: serde_json::json!({
                "genre": top.name,
                "read_count": top.read_count,
            }),
        }]
    }
}

impl Default for ContentPreferenceIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternIdentifier for ContentPreferenceIdentifier {
    fn name(&self) -> &str {
        "preference.content"
    }

    fn identify(&self, ctx: &AnalyticsContext) -> Result<Vec<PatternObservation>> {
        let rows = ctx.db.top_genres(1)?;
        Ok(Self::observations_from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, read_count: i64) -> EntityReadCount {
        EntityReadCount {
            name: name.to_string(),
            read_count,
        }
    }

    #[test]
    fn test_observation_shape() {
        let obs = ContentPreferenceIdentifier::observations_from_rows(&[row("Isekai", 120)]);

        assert_eq!(obs.len(), 1);
        let o = &obs[0];
        assert_eq!(o.pattern_type, PatternType::ContentPreference);
        assert_eq!(o.name, "favorite_genre");
        assert_eq!(o.value, "Isekai leads reading activity with 120 reads");
        assert_eq!(o.frequency, 120);
        assert_eq!(o.confidence, 0.85);
        assert_eq!(o.metadata["genre"], "Isekai");
    }

    #[test]
    fn test_no_reads_no_observation() {
        // A genre that exists but was never read is not a preference
        assert!(ContentPreferenceIdentifier::observations_from_rows(&[row("Mecha", 0)]).is_empty());
        assert!(ContentPreferenceIdentifier::observations_from_rows(&[]).is_empty());
    }
}
