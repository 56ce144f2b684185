//! # tsundoku-insights
//!
//! Analytics and recommendation engine for the Tsundoku reading platform.
//!
//! This library provides:
//! - Domain types for metrics, recommendations and reading patterns
//! - Database storage layer with SQLite
//! - Recommendation analyzers and pattern identifiers
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way through two layers:
//! - **Layer 1 (Catalog snapshot):** novels, authors, genres, tags, library
//!   entries, reading history and reviews, ingested by the host application
//! - **Layer 2 (Derived):** metrics, recommendations, patterns and run
//!   records, written only by the engine and fully regenerable
//!
//! The engine never writes Layer 1 and never reads back its own derived
//! rows to compute new ones.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tsundoku_insights::{create_default_engine, Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let mut engine = create_default_engine();
//! engine.set_disabled_analyzers(config.analytics.disabled_analyzers.clone());
//!
//! let recommendations = engine.generate_all_recommendations(&db);
//! let patterns = engine.identify_all_patterns(&db);
//! println!("{} new recommendations, {} patterns", recommendations.len(), patterns.len());
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{create_default_engine, AnalyticsEngine, MetricCalculator};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
