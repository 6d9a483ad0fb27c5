//! Core trending pipeline: dedupe, score, filter, balance, rank

pub mod balance;
pub mod dedupe;
pub mod deltas;
pub mod filters;
pub mod scoring;
pub mod trending;

pub use balance::{balance_by_language, language_quotas};
pub use dedupe::{dedupe_by_id, dedupe_by_name, dedupe_songs, merge_duplicates};
pub use deltas::{calculate_deltas, format_delta, DeltaDisplay, DeltaTrend};
pub use scoring::{compute_trend_score, determine_badges, is_new_song, TrendScore};
pub use trending::{RefreshState, TrendingQuery, TrendingService};
