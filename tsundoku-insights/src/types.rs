//! Core domain types for tsundoku-insights
//!
//! The engine reads a catalog snapshot (Layer 1) and writes derived
//! analytics (Layer 2). Types here cover both sides.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Novel** | A catalog entry with chapters, an author, genres and tags |
//! | **Library entry** | A reader's shelf row for one novel, with a completion status |
//! | **Reading event** | One chapter read by one reader, with an optional duration |
//! | **Metric** | An append-only scalar derived from aggregates |
//! | **Recommendation** | A discrete, deduplicated improvement proposal for curators |
//! | **Pattern** | A continuously-refreshed descriptive observation |
//!
//! Recommendations and patterns deliberately differ on duplicates:
//! a duplicate recommendation is *skipped* (the action lifecycle governs
//! removal), a duplicate pattern is *refreshed in place*.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Metric
// ============================================

/// Category of a derived metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Engagement,
    Popularity,
    Retention,
    Abandonment,
    ReadingSpeed,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Engagement => "engagement",
            MetricType::Popularity => "popularity",
            MetricType::Retention => "retention",
            MetricType::Abandonment => "abandonment",
            MetricType::ReadingSpeed => "reading_speed",
        }
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "engagement" => Ok(MetricType::Engagement),
            "popularity" => Ok(MetricType::Popularity),
            "retention" => Ok(MetricType::Retention),
            "abandonment" => Ok(MetricType::Abandonment),
            "reading_speed" => Ok(MetricType::ReadingSpeed),
            _ => Err(format!("unknown metric type: {}", s)),
        }
    }
}

/// A derived scalar metric.
///
/// Immutable once created: each computation run appends new rows rather
/// than mutating old ones. Value semantics depend on the type: percentages
/// are 0-100, counts are non-negative integers, rates are non-negative
/// decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    /// Row id (0 until stored)
    pub id: i64,
    /// Metric category
    pub metric_type: MetricType,
    /// Metric name (e.g., "average_reading_time")
    pub name: String,
    /// Scalar value
    pub value: f64,
    /// When this value was computed
    pub computed_at: DateTime<Utc>,
    /// Extensible metadata
    pub metadata: serde_json::Value,
}

// ============================================
// Recommendation
// ============================================

/// Category of a curator recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Genre,
    Author,
    Quality,
    Length,
    TagDemand,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Genre => "genre",
            RecommendationType::Author => "author",
            RecommendationType::Quality => "quality",
            RecommendationType::Length => "length",
            RecommendationType::TagDemand => "tag_demand",
        }
    }
}

impl std::str::FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genre" => Ok(RecommendationType::Genre),
            "author" => Ok(RecommendationType::Author),
            "quality" => Ok(RecommendationType::Quality),
            "length" => Ok(RecommendationType::Length),
            "tag_demand" => Ok(RecommendationType::TagDemand),
            _ => Err(format!("unknown recommendation type: {}", s)),
        }
    }
}

/// Recommendation priority tier. Stored as its numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub fn as_i64(&self) -> i64 {
        *self as i64
    }

    /// Parse a stored priority value, clamping unknown values to Low.
    pub fn from_i64(value: i64) -> Self {
        match value {
            3 => Priority::High,
            2 => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

/// A stored curator recommendation.
///
/// Lifecycle: created pending, may be marked read, then implemented, and
/// reverted back. `is_implemented` implies `is_read`. Among rows that are
/// not yet implemented, `(rec_type, title)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Row id
    pub id: i64,
    /// Recommendation category
    pub rec_type: RecommendationType,
    /// Short title; dedup key together with `rec_type` (case-sensitive)
    pub title: String,
    /// Natural-language description embedding the supporting numbers
    pub description: String,
    /// Priority tier
    pub priority: Priority,
    /// Confidence in [0.0, 1.0]; analyzers never emit above 0.95
    pub confidence: f64,
    /// When the recommendation was created
    pub created_at: DateTime<Utc>,
    /// Whether a curator has seen it
    pub is_read: bool,
    /// Whether a curator has acted on it
    pub is_implemented: bool,
    /// Extensible metadata
    pub metadata: serde_json::Value,
}

/// A candidate recommendation produced by an analyzer, before storage.
#[derive(Debug, Clone)]
pub struct NewRecommendation {
    pub rec_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub confidence: f64,
    pub metadata: serde_json::Value,
}

// ============================================
// Pattern
// ============================================

/// Category of a reading pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    TimePreference,
    ContentPreference,
    EngagementPattern,
    AbandonmentPattern,
    CompletionPattern,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::TimePreference => "time_preference",
            PatternType::ContentPreference => "content_preference",
            PatternType::EngagementPattern => "engagement_pattern",
            PatternType::AbandonmentPattern => "abandonment_pattern",
            PatternType::CompletionPattern => "completion_pattern",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time_preference" => Ok(PatternType::TimePreference),
            "content_preference" => Ok(PatternType::ContentPreference),
            "engagement_pattern" => Ok(PatternType::EngagementPattern),
            "abandonment_pattern" => Ok(PatternType::AbandonmentPattern),
            "completion_pattern" => Ok(PatternType::CompletionPattern),
            _ => Err(format!("unknown pattern type: {}", s)),
        }
    }
}

/// A stored reading pattern.
///
/// `(pattern_type, name)` is unique; a new observation for an existing key
/// overwrites value, confidence, frequency and timestamp in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    /// Row id
    pub id: i64,
    /// Pattern category
    pub pattern_type: PatternType,
    /// Stable name; upsert key together with `pattern_type` (case-sensitive)
    pub name: String,
    /// Human-readable description of the observation
    pub value: String,
    /// Occurrence count backing the observation
    pub frequency: i64,
    /// Confidence in [0.0, 1.0]
    pub confidence: f64,
    /// When the observation was last refreshed
    pub identified_at: DateTime<Utc>,
    /// Extensible metadata
    pub metadata: serde_json::Value,
}

/// A candidate pattern produced by an identifier, before storage.
#[derive(Debug, Clone)]
pub struct PatternObservation {
    pub pattern_type: PatternType,
    pub name: String,
    pub value: String,
    pub frequency: i64,
    pub confidence: f64,
    pub metadata: serde_json::Value,
}

// ============================================
// Library status
// ============================================

/// Shelf status of a library entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryStatus {
    Reading,
    Completed,
    Dropped,
    PlanToRead,
}

impl LibraryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryStatus::Reading => "reading",
            LibraryStatus::Completed => "completed",
            LibraryStatus::Dropped => "dropped",
            LibraryStatus::PlanToRead => "plan_to_read",
        }
    }
}

impl std::str::FromStr for LibraryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reading" => Ok(LibraryStatus::Reading),
            "completed" => Ok(LibraryStatus::Completed),
            "dropped" => Ok(LibraryStatus::Dropped),
            "plan_to_read" => Ok(LibraryStatus::PlanToRead),
            _ => Err(format!("unknown library status: {}", s)),
        }
    }
}

// ============================================
// Status filter
// ============================================

/// Filter for querying or deleting recommendations by lifecycle state.
///
/// `Pending` matches rows that are neither read nor implemented; `Read`
/// matches rows read but not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Pending,
    Read,
    Implemented,
    All,
}

impl StatusFilter {
    /// SQL predicate for this filter against the recommendations table.
    pub fn as_predicate(&self) -> &'static str {
        match self {
            StatusFilter::Pending => "is_read = 0 AND is_implemented = 0",
            StatusFilter::Read => "is_read = 1 AND is_implemented = 0",
            StatusFilter::Implemented => "is_implemented = 1",
            StatusFilter::All => "1 = 1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_enum_storage_round_trip() {
        for mt in [
            MetricType::Engagement,
            MetricType::Popularity,
            MetricType::Retention,
            MetricType::Abandonment,
            MetricType::ReadingSpeed,
        ] {
            assert_eq!(MetricType::from_str(mt.as_str()).unwrap(), mt);
        }

        for rt in [
            RecommendationType::Genre,
            RecommendationType::Author,
            RecommendationType::Quality,
            RecommendationType::Length,
            RecommendationType::TagDemand,
        ] {
            assert_eq!(RecommendationType::from_str(rt.as_str()).unwrap(), rt);
        }

        for pt in [
            PatternType::TimePreference,
            PatternType::ContentPreference,
            PatternType::EngagementPattern,
            PatternType::AbandonmentPattern,
            PatternType::CompletionPattern,
        ] {
            assert_eq!(PatternType::from_str(pt.as_str()).unwrap(), pt);
        }

        for ls in [
            LibraryStatus::Reading,
            LibraryStatus::Completed,
            LibraryStatus::Dropped,
            LibraryStatus::PlanToRead,
        ] {
            assert_eq!(LibraryStatus::from_str(ls.as_str()).unwrap(), ls);
        }
    }

    #[test]
    fn test_priority_values() {
        assert_eq!(Priority::Low.as_i64(), 1);
        assert_eq!(Priority::Medium.as_i64(), 2);
        assert_eq!(Priority::High.as_i64(), 3);

        assert_eq!(Priority::from_i64(3), Priority::High);
        assert_eq!(Priority::from_i64(2), Priority::Medium);
        assert_eq!(Priority::from_i64(1), Priority::Low);
        // Unknown stored values degrade to Low rather than failing the read
        assert_eq!(Priority::from_i64(0), Priority::Low);
        assert_eq!(Priority::from_i64(99), Priority::Low);
    }

    #[test]
    fn test_unknown_strings_rejected() {
        assert!(MetricType::from_str("velocity").is_err());
        assert!(RecommendationType::from_str("misc").is_err());
        assert!(PatternType::from_str("weekly").is_err());
        assert!(LibraryStatus::from_str("on_hold").is_err());
    }
}
