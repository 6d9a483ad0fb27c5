//! Persistent stores for the trending cache and play-count history

pub mod storage;
mod trending_store;

pub use storage::{JsonDirStorage, KeyValueStorage, MemoryStorage, TypedStorage};
pub use trending_store::{TrendingStore, CACHE_KEY, CACHE_VERSION, HISTORY_KEY, LEGACY_KEYS};
