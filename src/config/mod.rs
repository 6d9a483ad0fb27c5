//! Configuration module for trendmix
//!
//! Trending weights/thresholds and filesystem path management.

mod paths;
mod trending_config;

pub use paths::Paths;
pub use trending_config::{BadgeThresholds, ScoreWeights, TrendingConfig};

/// Cached trending lists are served for this long
pub const CACHE_TTL_MINUTES: i64 = 10;

/// History snapshots older than this are pruned
pub const HISTORY_RETENTION_HOURS: i64 = 72;

/// Maximum snapshots kept per song
pub const HISTORY_MAX_SNAPSHOTS: usize = 100;
