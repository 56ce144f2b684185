//! Scalar metric derivation
//!
//! Each metric is computed independently from its own aggregate query and
//! appended to the metrics table. A failed calculation is logged and
//! degrades to a zero-value metric; it never fails the caller.

use crate::db::Database;
use crate::error::Result;
use crate::types::{Metric, MetricType};
use chrono::Utc;

/// Derives engagement/retention/popularity metrics from aggregate rows.
#[derive(Debug, Clone)]
pub struct MetricCalculator {
    /// Entries kept per popularity ranking
    top_limit: usize,
    /// Trailing window for the active-user metric, in days
    active_window_days: u32,
}

impl MetricCalculator {
    /// Create a calculator with default limits (top 10, 30-day window).
    pub fn new() -> Self {
        Self {
            top_limit: 10,
            active_window_days: 30,
        }
    }

    /// Create a calculator with explicit limits.
    pub fn with_limits(top_limit: usize, active_window_days: u32) -> Self {
        Self {
            top_limit,
            active_window_days,
        }
    }

    /// Compute and store every metric, returning the batch.
    ///
    /// Calculations are independent: one failing aggregate query yields a
    /// zero-value metric for that name and the rest still compute.
    pub fn compute_all(&self, db: &Database) -> Vec<Metric> {
        let mut metrics = vec![
            Self::scalar(
                MetricType::Engagement,
                "average_reading_time",
                db.average_reading_time(),
            ),
            Self::scalar(
                MetricType::Abandonment,
                "abandonment_rate",
                db.abandonment_rate(),
            ),
            Self::scalar(
                MetricType::Retention,
                "active_users",
                db.active_users(self.active_window_days).map(|c| c as f64),
            ),
            Self::scalar(
                MetricType::ReadingSpeed,
                "average_chapters_read",
                db.average_chapters_read(),
            ),
        ];

        metrics.extend(self.popularity(db));

        for metric in &mut metrics {
            match db.insert_metric(metric) {
                Ok(id) => metric.id = id,
                Err(e) => {
                    tracing::warn!(metric = %metric.name, error = %e, "Failed to store metric");
                }
            }
        }

        tracing::info!(count = metrics.len(), "Metrics computed");
        metrics
    }

    /// Build a scalar metric, defaulting to zero on a failed aggregate.
    fn scalar(metric_type: MetricType, name: &str, value: Result<f64>) -> Metric {
        let value = match value {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(metric = name, error = %e, "Metric calculation failed; defaulting to zero");
                0.0
            }
        };

        Metric {
            id: 0,
            metric_type,
            name: name.to_string(),
            value,
            computed_at: Utc::now(),
            metadata: serde_json::json!({}),
        }
    }

    /// Popularity rankings: one metric row per ranked entity.
    fn popularity(&self, db: &Database) -> Vec<Metric> {
        let mut out = Vec::new();
        let now = Utc::now();

        match db.top_novels(self.top_limit) {
            Ok(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    out.push(Metric {
                        id: 0,
                        metric_type: MetricType::Popularity,
                        name: "novel_read_count".to_string(),
                        value: row.read_count as f64,
                        computed_at: now,
                        metadata: serde_json::json!({
                            "novel_id": row.novel_id,
                            "title": row.title,
                            "rating": row.rating,
                            "rank": i + 1,
                        }),
                    });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Top-novel ranking failed; skipping");
            }
        }

        match db.top_genres(self.top_limit) {
            Ok(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    out.push(Metric {
                        id: 0,
                        metric_type: MetricType::Popularity,
                        name: "genre_read_count".to_string(),
                        value: row.read_count as f64,
                        computed_at: now,
                        metadata: serde_json::json!({"name": row.name, "rank": i + 1}),
                    });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Top-genre ranking failed; skipping");
            }
        }

        match db.top_authors(self.top_limit) {
            Ok(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    out.push(Metric {
                        id: 0,
                        metric_type: MetricType::Popularity,
                        name: "author_read_count".to_string(),
                        value: row.read_count as f64,
                        computed_at: now,
                        metadata: serde_json::json!({"name": row.name, "rank": i + 1}),
                    });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Top-author ranking failed; skipping");
            }
        }

        out
    }
}

impl Default for MetricCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LibraryStatus;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn test_empty_database_yields_zero_scalars() {
        let db = test_db();
        let metrics = MetricCalculator::new().compute_all(&db);

        // Four scalar metrics, no popularity rows without catalog entries
        assert_eq!(metrics.len(), 4);
        for metric in &metrics {
            assert_eq!(metric.value, 0.0);
            assert!(metric.id > 0, "metric should be stored");
        }
    }

    #[test]
    fn test_compute_all_appends_rows() {
        let db = test_db();
        let calc = MetricCalculator::new();

        calc.compute_all(&db);
        calc.compute_all(&db);

        // Append-only store: two runs, two rows per scalar metric
        let stored = db.list_metrics(Some(MetricType::Abandonment), 10).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_scalar_and_popularity_values() {
        let db = test_db();
        db.upsert_author("a1", "Yuki Sato").unwrap();
        db.upsert_novel("n1", "Blade of Dawn", Some("a1"), 120).unwrap();
        db.upsert_genre("g1", "Isekai").unwrap();
        db.link_novel_genre("n1", "g1").unwrap();

        let now = Utc::now();
        db.insert_reading_event("u1", "n1", 1, now, Some(240)).unwrap();
        db.insert_reading_event("u1", "n1", 2, now, Some(360)).unwrap();
        db.upsert_library_entry("u1", "n1", LibraryStatus::Dropped).unwrap();
        db.upsert_library_entry("u2", "n1", LibraryStatus::Reading).unwrap();

        let metrics = MetricCalculator::with_limits(5, 30).compute_all(&db);

        let by_name = |name: &str| {
            metrics
                .iter()
                .find(|m| m.name == name)
                .unwrap_or_else(|| panic!("missing metric {}", name))
        };

        assert_eq!(by_name("average_reading_time").value, 300.0);
        assert_eq!(by_name("abandonment_rate").value, 50.0);
        assert_eq!(by_name("active_users").value, 1.0);
        assert_eq!(by_name("average_chapters_read").value, 2.0);

        let novel_rank = by_name("novel_read_count");
        assert_eq!(novel_rank.value, 2.0);
        assert_eq!(novel_rank.metadata["rank"], 1);
        assert_eq!(novel_rank.metadata["title"], "Blade of Dawn");

        assert_eq!(by_name("genre_read_count").value, 2.0);
        assert_eq!(by_name("author_read_count").value, 2.0);
    }

    #[test]
    fn test_failed_aggregate_defaults_to_zero() {
        let db = test_db();
        // Sabotage one aggregate source; its metric degrades to zero and the
        // batch still completes
        db.connection()
            .execute("DROP TABLE reading_history", [])
            .unwrap();

        let metrics = MetricCalculator::new().compute_all(&db);
        let reading_time = metrics
            .iter()
            .find(|m| m.name == "average_reading_time")
            .unwrap();
        assert_eq!(reading_time.value, 0.0);

        let abandonment = metrics.iter().find(|m| m.name == "abandonment_rate");
        assert!(abandonment.is_some());
    }
}
