//! Recommendation analyzers
//!
//! Each analyzer lives in its own module to keep its policy, mapping and
//! tests together.
//!
//! ## Built-in analyzers
//!
//! Core sequence, in run order:
//!
//! - [`genre_demand`]: undersupplied genres with proven readership
//! - [`author_engagement`]: well-rated, well-read authors worth promoting
//! - [`quality`]: poorly rated novels sitting in readers' libraries
//! - [`length_preference`]: the chapter-count range readers favor
//! - [`abandonment`]: catalog-wide drop-rate alarm
//!
//! Standalone (run after the core sequence; triggers on votes, not reads):
//!
//! - [`tag_demand`]: high-vote tags with almost no supply
//!
//! ## Creating custom analyzers
//!
//! 1. Implement [`RecommendationAnalyzer`](super::RecommendationAnalyzer)
//! 2. Register it via [`AnalyticsEngine::register`](super::AnalyticsEngine::register)
//!
//! Or use [`create_default_engine`] to get an engine with every built-in
//! strategy registered.

pub mod abandonment;
pub mod author_engagement;
pub mod genre_demand;
pub mod length_preference;
pub mod quality;
pub mod tag_demand;

pub use abandonment::AbandonmentAnalyzer;
pub use author_engagement::AuthorEngagementAnalyzer;
pub use genre_demand::GenreDemandAnalyzer;
pub use length_preference::LengthPreferenceAnalyzer;
pub use quality::QualityAnalyzer;
pub use tag_demand::TagDemandAnalyzer;

use super::patterns::{CompletionDistributionIdentifier, ContentPreferenceIdentifier};
use super::AnalyticsEngine;

/// Create an engine with all built-in strategies registered.
///
/// The core analyzers run in the fixed order genre, author, quality,
/// length, abandonment; tag demand runs after them as a standalone
/// strategy. Both pattern identifiers are registered.
///
/// ```rust,ignore
/// use tsundoku_insights::analytics::create_default_engine;
///
/// let engine = create_default_engine();
/// println!("Registered analyzers: {:?}", engine.analyzer_names());
/// ```
pub fn create_default_engine() -> AnalyticsEngine {
    let mut engine = AnalyticsEngine::new();
    engine.register(Box::new(GenreDemandAnalyzer::new()));
    engine.register(Box::new(AuthorEngagementAnalyzer::new()));
    engine.register(Box::new(QualityAnalyzer::new()));
    engine.register(Box::new(LengthPreferenceAnalyzer::new()));
    engine.register(Box::new(AbandonmentAnalyzer::new()));
    engine.register_standalone(Box::new(TagDemandAnalyzer::new()));
    engine.register_identifier(Box::new(ContentPreferenceIdentifier::new()));
    engine.register_identifier(Box::new(CompletionDistributionIdentifier::new()));
    engine
}
