//! Trending orchestration
//!
//! A refresh cycle fetches one candidate pool per language, then runs the synchronous pipeline:
//! shuffle, slice, dedupe, filter, score, split per language, interleave, rank. The result is
//! cached for the store TTL. Concurrent refresh requests share one in-flight cycle.

use chrono::{DateTime, Duration, Utc};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::TrendingConfig;
use crate::core::deltas::calculate_deltas;
use crate::core::dedupe::dedupe_songs;
use crate::core::filters::{check_candidate, Rejection};
use crate::core::scoring::{compute_trend_score, determine_badges};
use crate::error::{Result, TrendingError};
use crate::models::{Song, SongHistory, SongImage, SongLike, TrendingSong};
use crate::sources::SongSource;
use crate::stores::{KeyValueStorage, TrendingStore};
use crate::utils::dates::{current_year, humanize_since, Clock, SystemClock};
use crate::utils::language::lang_code_or_unknown;

/// Extra multiplier for songs released this year
const CURRENT_YEAR_BOOST: f64 = 1.2;
/// Extra multiplier for songs released last year
const PREVIOUS_YEAR_BOOST: f64 = 1.1;

/// Request for a trending list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingQuery {
    pub limit: usize,
    /// Skip the cache and run a refresh cycle
    pub force_refresh: bool,
    /// Restrict the result to these languages (names or codes)
    pub languages: Option<Vec<String>>,
}

impl Default for TrendingQuery {
    fn default() -> Self {
        Self {
            limit: 25,
            force_refresh: false,
            languages: None,
        }
    }
}

impl TrendingQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn force(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn languages<S: Into<String>>(mut self, languages: impl IntoIterator<Item = S>) -> Self {
        self.languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }
}

/// Where the service is in its refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Fetching,
    Processing,
    Cached,
}

type SharedRefresh = Shared<BoxFuture<'static, Result<Vec<TrendingSong>>>>;

struct Inner {
    source: Arc<dyn SongSource>,
    clock: Arc<dyn Clock>,
    config: RwLock<TrendingConfig>,
    store: Mutex<TrendingStore>,
    state: Mutex<RefreshState>,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl Inner {
    fn set_state(&self, state: RefreshState) {
        *self.state.lock() = state;
    }
}

/// Trending service: config, cache, history and the refresh pipeline.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TrendingService {
    inner: Arc<Inner>,
}

impl TrendingService {
    /// Create a service on the system clock
    pub fn new(
        source: Arc<dyn SongSource>,
        storage: Arc<dyn KeyValueStorage>,
        config: TrendingConfig,
    ) -> Self {
        Self::with_clock(source, storage, config, Arc::new(SystemClock))
    }

    /// Create a service with an explicit clock
    pub fn with_clock(
        source: Arc<dyn SongSource>,
        storage: Arc<dyn KeyValueStorage>,
        config: TrendingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = TrendingStore::open(storage);
        let state = if store.cached().is_some() {
            RefreshState::Cached
        } else {
            RefreshState::Idle
        };

        Self {
            inner: Arc::new(Inner {
                source,
                clock,
                config: RwLock::new(config),
                store: Mutex::new(store),
                state: Mutex::new(state),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Get the trending list, from cache when valid, otherwise via a refresh cycle
    pub async fn get_trending_songs(&self, query: TrendingQuery) -> Result<Vec<TrendingSong>> {
        if !query.force_refresh {
            let now = self.inner.clock.now();
            let cached = self.inner.store.lock().get(now).map(<[TrendingSong]>::to_vec);
            if let Some(songs) = cached {
                debug!("Serving {} trending songs from cache", songs.len());
                return Ok(apply_query(songs, &query));
            }
        }

        let songs = self.refresh_handle(query.limit).await?;
        Ok(apply_query(songs, &query))
    }

    /// Join the in-flight refresh, or start one
    fn refresh_handle(&self, limit: usize) -> SharedRefresh {
        let mut slot = self.inner.in_flight.lock();
        if let Some(existing) = slot.as_ref() {
            debug!("Joining in-flight trending refresh");
            return existing.clone();
        }

        let refresh = run_refresh(self.inner.clone(), limit).boxed().shared();
        *slot = Some(refresh.clone());
        refresh
    }

    /// Age of the cached list, if there is one
    pub fn cache_age(&self) -> Option<Duration> {
        let now = self.inner.clock.now();
        self.inner.store.lock().cache_age(now)
    }

    /// True when there is no cached list or it has outlived the TTL
    pub fn is_stale(&self) -> bool {
        let now = self.inner.clock.now();
        !self.inner.store.lock().is_valid(now)
    }

    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.inner.store.lock().last_update()
    }

    /// Last update as relative text, e.g. "5 minutes ago"
    pub fn last_update_human(&self) -> Option<String> {
        let now = self.inner.clock.now();
        self.last_update_time().map(|t| humanize_since(t, now))
    }

    /// Current configuration
    pub fn config(&self) -> TrendingConfig {
        self.inner.config.read().clone()
    }

    /// Change the configuration. Invalid results are rejected and the old config kept.
    pub fn update_config<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut TrendingConfig),
    {
        let mut next = self.config();
        next.update(f);
        next.validate().map_err(|e| TrendingError::Config(e.to_string()))?;
        *self.inner.config.write() = next;
        info!("Trending config updated");
        Ok(())
    }

    /// Wipe the cached list and all history
    pub fn clear_cache(&self) -> Result<()> {
        self.inner.store.lock().clear()?;
        self.inner.set_state(RefreshState::Idle);
        Ok(())
    }

    /// Play-count snapshots recorded for a song
    pub fn history_for(&self, song_id: &str) -> Vec<SongHistory> {
        self.inner.store.lock().history_for(song_id).to_vec()
    }

    pub fn state(&self) -> RefreshState {
        *self.inner.state.lock()
    }
}

/// Resets the refresh slot and state when a refresh ends, including by panic
struct RefreshGuard {
    inner: Arc<Inner>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        let has_cache = self.inner.store.lock().cached().is_some();
        self.inner.set_state(if has_cache {
            RefreshState::Cached
        } else {
            RefreshState::Idle
        });
        *self.inner.in_flight.lock() = None;
    }
}

async fn run_refresh(inner: Arc<Inner>, limit: usize) -> Result<Vec<TrendingSong>> {
    let _guard = RefreshGuard {
        inner: inner.clone(),
    };
    let refresh_id = Uuid::new_v4();

    match refresh_cycle(&inner, limit, refresh_id).await {
        Ok(songs) => Ok(songs),
        Err(e) => {
            let stale = inner.store.lock().cached().map(|c| c.songs.clone());
            match stale {
                Some(songs) => {
                    warn!(%refresh_id, "Trending refresh failed ({}), serving stale cache", e);
                    Ok(songs)
                }
                None => {
                    error!(
                        %refresh_id,
                        "Trending refresh failed with no cache to fall back on: {}", e
                    );
                    Err(e)
                }
            }
        }
    }
}

async fn refresh_cycle(inner: &Inner, limit: usize, refresh_id: Uuid) -> Result<Vec<TrendingSong>> {
    let config = inner.config.read().clone();
    inner.set_state(RefreshState::Fetching);
    info!(%refresh_id, "Refreshing trending songs for {} languages", config.languages.len());

    let pools = fetch_pools(inner.source.as_ref(), &config.languages, refresh_id).await?;

    inner.set_state(RefreshState::Processing);
    let now = inner.clock.now();

    let mut store = inner.store.lock();
    let processed = process_pools(pools, &config, limit, now, &store, &mut rand::thread_rng());
    let previous = store
        .cached()
        .map(|c| c.songs.clone())
        .unwrap_or_default();
    let ranked = calculate_deltas(&processed.ranked, &previous);

    if let Err(e) = store.record_history(&processed.observed, now) {
        error!(%refresh_id, "Failed to persist trending history: {}", e);
    }
    if let Err(e) = store.put(ranked.clone(), now) {
        error!(%refresh_id, "Failed to persist trending cache: {}", e);
    }

    info!(
        %refresh_id,
        "Trending refresh complete: {} ranked from {} candidates",
        ranked.len(),
        processed.observed.len()
    );
    Ok(ranked)
}

/// Fetch every language pool concurrently. A failing pool becomes empty; all failing is an
/// error.
async fn fetch_pools(
    source: &dyn SongSource,
    languages: &[String],
    refresh_id: Uuid,
) -> Result<Vec<(String, Vec<Song>)>> {
    let results = join_all(languages.iter().map(|lang| source.fetch_trending(lang))).await;

    let mut failures = 0;
    let mut pools = Vec::with_capacity(languages.len());
    for (lang, result) in languages.iter().zip(results) {
        match result {
            Ok(mut songs) => {
                for song in songs.iter_mut() {
                    let missing = song
                        .language
                        .as_deref()
                        .map(|l| l.trim().is_empty())
                        .unwrap_or(true);
                    if missing {
                        song.language = Some(lang.clone());
                    }
                }
                debug!(%refresh_id, "Fetched {} candidates for {}", songs.len(), lang);
                pools.push((lang.clone(), songs));
            }
            Err(e) => {
                warn!(%refresh_id, "Failed to fetch trending songs for {}: {:#}", lang, e);
                failures += 1;
                pools.push((lang.clone(), Vec::new()));
            }
        }
    }

    if !languages.is_empty() && failures == languages.len() {
        return Err(TrendingError::AllSourcesFailed {
            attempted: languages.len(),
        });
    }
    Ok(pools)
}

/// Output of the synchronous pipeline
struct Processed {
    /// Interleaved list, not yet ranked
    ranked: Vec<TrendingSong>,
    /// Every candidate that survived filtering and was scored
    observed: Vec<Song>,
}

fn process_pools<R: Rng>(
    pools: Vec<(String, Vec<Song>)>,
    config: &TrendingConfig,
    limit: usize,
    now: DateTime<Utc>,
    store: &TrendingStore,
    rng: &mut R,
) -> Processed {
    let language_count = pools.len().max(1);
    let per_language_slice = limit.div_ceil(language_count);

    let combined: Vec<Song> = pools
        .into_iter()
        .flat_map(|(_, mut songs)| {
            songs.shuffle(rng);
            songs.truncate(per_language_slice);
            songs
        })
        .collect();

    let unique = dedupe_songs(&combined);

    let mut rejections: HashMap<Rejection, usize> = HashMap::new();
    let survivors: Vec<Song> = unique
        .into_iter()
        .filter_map(|mut song| match check_candidate(&song, config, now) {
            Ok(image) => {
                song.image = Some(SongImage::Url(image));
                Some(song)
            }
            Err(reason) => {
                *rejections.entry(reason).or_insert(0) += 1;
                None
            }
        })
        .collect();
    if !rejections.is_empty() {
        debug!("Filtered trending candidates: {:?}", rejections);
    }

    let this_year = current_year(now);
    let scored: Vec<TrendingSong> = survivors
        .iter()
        .map(|song| {
            let result = compute_trend_score(song, store.history_for(&song.id), config, now);
            let boost = match song.release_year() {
                Some(year) if year == this_year => CURRENT_YEAR_BOOST,
                Some(year) if year == this_year - 1 => PREVIOUS_YEAR_BOOST,
                _ => 1.0,
            };
            let score = result.score * boost;
            let badges = determine_badges(song, score, result.velocity, config, now);
            TrendingSong::new(song.clone(), score, result.velocity, badges, now)
        })
        .collect();

    let languages: Vec<String> = config
        .languages
        .iter()
        .map(|l| lang_code_or_unknown(Some(l)))
        .collect();

    Processed {
        ranked: split_evenly(scored, &languages, limit),
        observed: survivors,
    }
}

/// Bucket by language, keep the top `limit / languages` of each by score, then interleave
/// round-robin in `languages` order. The division remainder is dropped.
fn split_evenly(
    scored: Vec<TrendingSong>,
    languages: &[String],
    limit: usize,
) -> Vec<TrendingSong> {
    if languages.is_empty() {
        return Vec::new();
    }

    let per_language = limit / languages.len();
    let mut buckets: Vec<Vec<TrendingSong>> = vec![Vec::new(); languages.len()];
    for song in scored {
        let code = lang_code_or_unknown(song.song_language());
        if let Some(i) = languages.iter().position(|l| *l == code) {
            buckets[i].push(song);
        }
    }

    for bucket in buckets.iter_mut() {
        bucket.sort_by(|a, b| b.score.total_cmp(&a.score));
        bucket.truncate(per_language);
    }

    interleave(buckets)
}

fn interleave(buckets: Vec<Vec<TrendingSong>>) -> Vec<TrendingSong> {
    let total: usize = buckets.iter().map(Vec::len).sum();
    let mut iters: Vec<_> = buckets.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::with_capacity(total);

    while out.len() < total {
        for iter in iters.iter_mut() {
            if let Some(song) = iter.next() {
                out.push(song);
            }
        }
    }
    out
}

/// Apply the caller's language filter and limit to a ranked list
fn apply_query(songs: Vec<TrendingSong>, query: &TrendingQuery) -> Vec<TrendingSong> {
    let wanted: Option<Vec<String>> = query
        .languages
        .as_ref()
        .filter(|langs| !langs.is_empty())
        .map(|langs| langs.iter().map(|l| lang_code_or_unknown(Some(l))).collect());

    songs
        .into_iter()
        .filter(|s| match &wanted {
            Some(codes) => codes.contains(&lang_code_or_unknown(s.song_language())),
            None => true,
        })
        .take(query.limit)
        .collect()
}
