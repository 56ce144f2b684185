//! Analytics engine
//!
//! Analyzers consume catalog aggregates (Layer 1) and produce derived
//! rows (Layer 2): recommendations, patterns and metrics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     ANALYTICS ENGINE                            │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐             │
//! │  │ Analyzer A  │  │ Analyzer B  │  │ Identifier  │  ...        │
//! │  │ (genre)     │  │ (author)    │  │ (completion)│             │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘             │
//! │         │                │                │                     │
//! │         ▼                ▼                ▼                     │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        AnalyticsEngine.generate/identify                │   │
//! │  │  - Runs each strategy against the aggregate queries     │   │
//! │  │  - Persists candidates through the dedup-aware store    │   │
//! │  │  - Records an AnalysisRunResult per strategy            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failure isolation: a strategy that errors is logged and recorded,
//! contributes nothing, and never stops the remaining strategies. The
//! public operations are total and return the rows produced this run.

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{Metric, NewRecommendation, Pattern, PatternObservation, Recommendation};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Instant;
use uuid::Uuid;

use super::metrics::MetricCalculator;

// ============================================
// Context
// ============================================

/// Context provided to analyzers and identifiers during a run.
///
/// Gives strategies read-only access to the aggregate queries.
pub struct AnalyticsContext<'a> {
    /// Read-only database access for aggregate queries
    pub db: &'a Database,
}

// ============================================
// Strategy traits
// ============================================

/// Trait implemented by each recommendation strategy.
///
/// Analyzers are stateless: they read aggregate rows through the context
/// and map them to candidate recommendations. They should be:
/// - **Deterministic**: Same input produces same output
/// - **Idempotent**: Safe to run repeatedly (the store skips duplicates)
pub trait RecommendationAnalyzer: Send + Sync {
    /// Unique name for this analyzer.
    ///
    /// Convention: `namespace.analyzer_name` (e.g., "demand.genre")
    fn name(&self) -> &str;

    /// Analyze the catalog aggregates and produce candidate recommendations.
    fn analyze(&self, ctx: &AnalyticsContext) -> Result<Vec<NewRecommendation>>;
}

/// Trait implemented by each pattern strategy.
///
/// Same shape as [`RecommendationAnalyzer`], but observations refresh
/// existing rows instead of being skipped as duplicates.
pub trait PatternIdentifier: Send + Sync {
    /// Unique name for this identifier.
    fn name(&self) -> &str;

    /// Inspect the catalog aggregates and produce pattern observations.
    fn identify(&self, ctx: &AnalyticsContext) -> Result<Vec<PatternObservation>>;
}

// ============================================
// Run results
// ============================================

/// Result of running one strategy.
///
/// Stored in the `analysis_runs` table for observability and debugging.
#[derive(Debug, Clone)]
pub struct AnalysisRunResult {
    /// UUID shared by every strategy in one engine invocation
    pub batch_id: String,
    /// Name of the strategy that was run
    pub analyzer: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// How long the run took (milliseconds)
    pub duration_ms: i64,
    /// Whether the run succeeded or failed
    pub status: RunStatus,
    /// Error message if the run failed
    pub error_message: Option<String>,
    /// Candidates the strategy produced
    pub candidates_produced: usize,
    /// Rows actually written (deduped candidates are produced but not saved)
    pub saved_count: usize,
}

/// Status of a strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Strategy completed successfully
    Success,
    /// Strategy encountered an error
    Error,
}

impl RunStatus {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }

    /// Parse status string from storage.
    pub fn from_storage(value: &str) -> Self {
        match value {
            "success" => RunStatus::Success,
            _ => RunStatus::Error,
        }
    }
}

// ============================================
// Engine
// ============================================

/// Engine that manages and runs the analytics strategies.
///
/// The engine is responsible for:
/// - Registering analyzers and pattern identifiers
/// - Running them in a fixed sequence
/// - Persisting candidates through the dedup-aware store
/// - Recording run results for observability
pub struct AnalyticsEngine {
    /// Core analyzers, run first in registration order
    analyzers: Vec<Box<dyn RecommendationAnalyzer>>,
    /// Standalone analyzers with structurally different triggers, run after
    /// the core sequence
    standalone: Vec<Box<dyn RecommendationAnalyzer>>,
    identifiers: Vec<Box<dyn PatternIdentifier>>,
    calculator: MetricCalculator,
    disabled: HashSet<String>,
}

impl AnalyticsEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
            standalone: Vec::new(),
            identifiers: Vec::new(),
            calculator: MetricCalculator::new(),
            disabled: HashSet::new(),
        }
    }

    /// Register a core analyzer. Core analyzers run in registration order.
    pub fn register(&mut self, analyzer: Box<dyn RecommendationAnalyzer>) {
        tracing::info!(analyzer = analyzer.name(), "Registered analyzer");
        self.analyzers.push(analyzer);
    }

    /// Register a standalone analyzer, run after the core sequence.
    pub fn register_standalone(&mut self, analyzer: Box<dyn RecommendationAnalyzer>) {
        tracing::info!(analyzer = analyzer.name(), "Registered standalone analyzer");
        self.standalone.push(analyzer);
    }

    /// Register a pattern identifier.
    pub fn register_identifier(&mut self, identifier: Box<dyn PatternIdentifier>) {
        tracing::info!(identifier = identifier.name(), "Registered pattern identifier");
        self.identifiers.push(identifier);
    }

    /// Replace the metric calculator (for non-default limits).
    pub fn set_calculator(&mut self, calculator: MetricCalculator) {
        self.calculator = calculator;
    }

    /// Disable strategies by name; disabled strategies are skipped at run time.
    pub fn set_disabled_analyzers<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled = names.into_iter().map(Into::into).collect();
    }

    /// Get the list of registered analyzer names, in run order.
    pub fn analyzer_names(&self) -> Vec<&str> {
        self.analyzers
            .iter()
            .chain(self.standalone.iter())
            .map(|a| a.name())
            .collect()
    }

    /// Check if an analyzer is registered.
    pub fn has_analyzer(&self, name: &str) -> bool {
        self.analyzers
            .iter()
            .chain(self.standalone.iter())
            .any(|a| a.name() == name)
    }

    fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    fn record_run(db: &Database, result: &AnalysisRunResult) {
        if let Err(e) = db.insert_analysis_run(result) {
            tracing::warn!(error = %e, "Failed to record analysis run");
        }
    }

    // ============================================
    // Recommendations
    // ============================================

    /// Run every registered analyzer and return the recommendations saved
    /// in this run.
    ///
    /// Core analyzers run first, in registration order, then standalone
    /// analyzers. Candidates matching an open recommendation are skipped by
    /// the store, which makes the operation idempotent: a second run over
    /// unchanged data saves nothing. A failing analyzer is logged and
    /// contributes zero recommendations; the batch never fails.
    pub fn generate_all_recommendations(&self, db: &Database) -> Vec<Recommendation> {
        let batch_id = Uuid::new_v4().to_string();
        let mut saved = Vec::new();

        for analyzer in self.analyzers.iter().chain(self.standalone.iter()) {
            if self.is_disabled(analyzer.name()) {
                tracing::debug!(analyzer = analyzer.name(), "Analyzer disabled, skipping");
                continue;
            }
            self.execute_analyzer(&batch_id, analyzer.as_ref(), db, &mut saved);
        }

        tracing::info!(
            batch_id = %batch_id,
            saved = saved.len(),
            "Recommendation generation complete"
        );
        saved
    }

    /// Run a specific analyzer by name.
    ///
    /// Returns the run result, which includes timing and status information.
    pub fn run_analyzer(&self, name: &str, db: &Database) -> Result<AnalysisRunResult> {
        let analyzer = self
            .analyzers
            .iter()
            .chain(self.standalone.iter())
            .find(|a| a.name() == name)
            .ok_or_else(|| Error::AnalyzerNotFound(name.to_string()))?;

        let batch_id = Uuid::new_v4().to_string();
        let mut saved = Vec::new();
        Ok(self.execute_analyzer(&batch_id, analyzer.as_ref(), db, &mut saved))
    }

    /// Run one analyzer, persist its candidates into `saved`, and record the run.
    fn execute_analyzer(
        &self,
        batch_id: &str,
        analyzer: &dyn RecommendationAnalyzer,
        db: &Database,
        saved: &mut Vec<Recommendation>,
    ) -> AnalysisRunResult {
        let ctx = AnalyticsContext { db };
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::debug!(analyzer = analyzer.name(), "Running analyzer");

        let result = match analyzer.analyze(&ctx) {
            Ok(candidates) => {
                let produced = candidates.len();
                let mut written = 0usize;

                for candidate in &candidates {
                    match db.save_recommendation(candidate) {
                        Ok(Some(rec)) => {
                            written += 1;
                            saved.push(rec);
                        }
                        Ok(None) => {
                            tracing::debug!(
                                analyzer = analyzer.name(),
                                title = %candidate.title,
                                "Duplicate recommendation skipped"
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                analyzer = analyzer.name(),
                                title = %candidate.title,
                                error = %e,
                                "Failed to save recommendation"
                            );
                        }
                    }
                }

                let duration_ms = start.elapsed().as_millis() as i64;
                tracing::info!(
                    analyzer = analyzer.name(),
                    produced,
                    saved = written,
                    duration_ms,
                    "Analyzer completed"
                );

                AnalysisRunResult {
                    batch_id: batch_id.to_string(),
                    analyzer: analyzer.name().to_string(),
                    started_at,
                    duration_ms,
                    status: RunStatus::Success,
                    error_message: None,
                    candidates_produced: produced,
                    saved_count: written,
                }
            }
            Err(e) => {
                let duration_ms = start.elapsed().as_millis() as i64;
                tracing::error!(
                    analyzer = analyzer.name(),
                    error = %e,
                    "Analyzer failed"
                );

                AnalysisRunResult {
                    batch_id: batch_id.to_string(),
                    analyzer: analyzer.name().to_string(),
                    started_at,
                    duration_ms,
                    status: RunStatus::Error,
                    error_message: Some(e.to_string()),
                    candidates_produced: 0,
                    saved_count: 0,
                }
            }
        };

        Self::record_run(db, &result);
        result
    }

    // ============================================
    // Patterns
    // ============================================

    /// Run every registered pattern identifier and return the refreshed rows.
    ///
    /// Observations upsert under `(pattern_type, name)`, so a second run over
    /// unchanged data refreshes rows in place instead of inserting new ones.
    pub fn identify_all_patterns(&self, db: &Database) -> Vec<Pattern> {
        let batch_id = Uuid::new_v4().to_string();
        let mut stored = Vec::new();

        for identifier in &self.identifiers {
            if self.is_disabled(identifier.name()) {
                tracing::debug!(identifier = identifier.name(), "Identifier disabled, skipping");
                continue;
            }
            stored.extend(self.execute_identifier(&batch_id, identifier.as_ref(), db));
        }

        tracing::info!(
            batch_id = %batch_id,
            stored = stored.len(),
            "Pattern identification complete"
        );
        stored
    }

    fn execute_identifier(
        &self,
        batch_id: &str,
        identifier: &dyn PatternIdentifier,
        db: &Database,
    ) -> Vec<Pattern> {
        let ctx = AnalyticsContext { db };
        let started_at = Utc::now();
        let start = Instant::now();
        let mut stored = Vec::new();

        tracing::debug!(identifier = identifier.name(), "Running pattern identifier");

        let result = match identifier.identify(&ctx) {
            Ok(observations) => {
                let produced = observations.len();

                for observation in &observations {
                    match db.save_pattern(observation) {
                        Ok(pattern) => stored.push(pattern),
                        Err(e) => {
                            tracing::warn!(
                                identifier = identifier.name(),
                                pattern = %observation.name,
                                error = %e,
                                "Failed to save pattern"
                            );
                        }
                    }
                }

                let duration_ms = start.elapsed().as_millis() as i64;
                tracing::info!(
                    identifier = identifier.name(),
                    produced,
                    stored = stored.len(),
                    duration_ms,
                    "Pattern identifier completed"
                );

                AnalysisRunResult {
                    batch_id: batch_id.to_string(),
                    analyzer: identifier.name().to_string(),
                    started_at,
                    duration_ms,
                    status: RunStatus::Success,
                    error_message: None,
                    candidates_produced: produced,
                    saved_count: stored.len(),
                }
            }
            Err(e) => {
                let duration_ms = start.elapsed().as_millis() as i64;
                tracing::error!(
                    identifier = identifier.name(),
                    error = %e,
                    "Pattern identifier failed"
                );

                AnalysisRunResult {
                    batch_id: batch_id.to_string(),
                    analyzer: identifier.name().to_string(),
                    started_at,
                    duration_ms,
                    status: RunStatus::Error,
                    error_message: Some(e.to_string()),
                    candidates_produced: 0,
                    saved_count: 0,
                }
            }
        };

        Self::record_run(db, &result);
        stored
    }

    // ============================================
    // Metrics
    // ============================================

    /// Compute and append every metric, returning the batch.
    ///
    /// Delegates to the [`MetricCalculator`]; individual calculation
    /// failures degrade to zero-value metrics.
    pub fn compute_metrics(&self, db: &Database) -> Vec<Metric> {
        self.calculator.compute_all(db)
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}
