//! Database layer for tsundoku-insights
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for aggregate queries and derived-table writes

pub mod repo;
pub mod schema;

pub use repo::{
    AuthorEngagementRow, CompletionDistribution, Database, EntityReadCount, GenreDemandRow,
    LengthBucketRow, LowRatedNovelRow, NovelReadCount, TagDemandRow,
};
