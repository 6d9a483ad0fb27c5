//! Trending cache and play-count history
//!
//! Holds the last ranked list (served for a fixed TTL) and per-song play-count snapshots used
//! for velocity. Both are written through to durable storage and reloaded on construction.
//! Updates build a new value and swap it in; nothing is edited in place.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::storage::{KeyValueStorage, TypedStorage};
use crate::config::{CACHE_TTL_MINUTES, HISTORY_MAX_SNAPSHOTS, HISTORY_RETENTION_HOURS};
use crate::error::Result;
use crate::models::{CachedTrending, Song, SongHistory, TrendingSong};

/// Schema version written with every cached list
pub const CACHE_VERSION: u32 = 3;

pub const CACHE_KEY: &str = "trending_cache_v3";
pub const HISTORY_KEY: &str = "trending_history_v3";

/// Keys written by earlier schema versions, removed on clear
pub const LEGACY_KEYS: &[&str] = &[
    "trending_cache",
    "trending_cache_v1",
    "trending_cache_v2",
    "trending_history",
    "trending_history_v1",
    "trending_history_v2",
];

type HistoryMap = HashMap<String, Vec<SongHistory>>;

/// Cache and history store
pub struct TrendingStore {
    storage: TypedStorage,
    cache: Option<Arc<CachedTrending>>,
    history: Arc<HistoryMap>,
}

impl TrendingStore {
    /// Open the store, loading whatever valid state was persisted earlier
    pub fn open(storage: Arc<dyn KeyValueStorage>) -> Self {
        let storage = TypedStorage::new(storage);

        let cache = storage
            .load::<CachedTrending>(CACHE_KEY)
            .filter(|c| {
                if c.version != CACHE_VERSION {
                    warn!(
                        "Ignoring cached trending list with version {} (expected {})",
                        c.version, CACHE_VERSION
                    );
                    return false;
                }
                true
            })
            .map(Arc::new);
        let history = storage.load::<HistoryMap>(HISTORY_KEY).unwrap_or_default();

        info!(
            "Trending store loaded: cached songs={}, tracked songs={}",
            cache.as_ref().map(|c| c.songs.len()).unwrap_or(0),
            history.len()
        );

        Self {
            storage,
            cache,
            history: Arc::new(history),
        }
    }

    /// Cache time-to-live
    pub fn ttl() -> Duration {
        Duration::minutes(CACHE_TTL_MINUTES)
    }

    /// Cached songs, if the cache exists and is younger than the TTL
    pub fn get(&self, now: DateTime<Utc>) -> Option<&[TrendingSong]> {
        self.cache
            .as_deref()
            .filter(|c| now - c.timestamp < Self::ttl())
            .map(|c| c.songs.as_slice())
    }

    /// The cached list regardless of age
    pub fn cached(&self) -> Option<&CachedTrending> {
        self.cache.as_deref()
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.get(now).is_some()
    }

    pub fn cache_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.cache.as_ref().map(|c| now - c.timestamp)
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.cache.as_ref().map(|c| c.timestamp)
    }

    /// Replace the cached list. Memory is updated even when persisting fails.
    pub fn put(&mut self, songs: Vec<TrendingSong>, now: DateTime<Utc>) -> Result<()> {
        let cache = Arc::new(CachedTrending {
            songs,
            timestamp: now,
            version: CACHE_VERSION,
        });
        self.cache = Some(cache.clone());
        debug!("Cached {} trending songs", cache.songs.len());
        self.storage.save(CACHE_KEY, cache.as_ref())
    }

    /// Snapshots for one song, oldest first
    pub fn history_for(&self, song_id: &str) -> &[SongHistory] {
        self.history
            .get(song_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of songs with at least one snapshot
    pub fn tracked_songs(&self) -> usize {
        self.history.len()
    }

    /// Append one snapshot per song, then prune every song's history to the retention window
    /// and snapshot cap
    pub fn record_history(&mut self, songs: &[Song], now: DateTime<Utc>) -> Result<()> {
        let mut next: HistoryMap = self.history.as_ref().clone();

        for song in songs.iter().filter(|s| s.has_id()) {
            next.entry(song.id.clone()).or_default().push(SongHistory {
                song_id: song.id.clone(),
                play_count: song.plays(),
                timestamp: now,
            });
        }

        let cutoff = now - Duration::hours(HISTORY_RETENTION_HOURS);
        for snapshots in next.values_mut() {
            snapshots.retain(|h| h.timestamp >= cutoff);
            if snapshots.len() > HISTORY_MAX_SNAPSHOTS {
                let excess = snapshots.len() - HISTORY_MAX_SNAPSHOTS;
                snapshots.drain(..excess);
            }
        }
        next.retain(|_, snapshots| !snapshots.is_empty());

        self.history = Arc::new(next);
        self.storage.save(HISTORY_KEY, self.history.as_ref())
    }

    /// Drop the cache and all history, including keys from earlier schema versions
    pub fn clear(&mut self) -> Result<()> {
        self.cache = None;
        self.history = Arc::new(HistoryMap::new());

        for key in [CACHE_KEY, HISTORY_KEY].iter().chain(LEGACY_KEYS) {
            self.storage.remove(key)?;
        }
        info!("Trending cache and history cleared");
        Ok(())
    }
}
