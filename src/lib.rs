//! trendmix - trending ranking and language balancing for multi-language song catalogs
//!
//! Takes song pools from catalog sources, dedupes and filters them, scores each song on
//! popularity, growth and recency, balances the list across languages and tracks rank
//! movement between refreshes. Results and play-count history persist in a key-value store.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod sources;
pub mod stores;
pub mod utils;

pub use crate::config::TrendingConfig;
pub use crate::core::{
    balance_by_language, calculate_deltas, compute_trend_score, dedupe_by_id, determine_badges,
    format_delta, is_new_song, RefreshState, TrendingQuery, TrendingService,
};
pub use crate::error::{Result, TrendingError};
pub use crate::models::{Badge, Song, SongImage, TrendingSong};
pub use crate::utils::{best_image, lang_code, lang_code_or_unknown, normalize_song_image};
