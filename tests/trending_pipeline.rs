//! End-to-end tests for the trending service

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use trendmix::sources::SongSource;
use trendmix::stores::{KeyValueStorage, MemoryStorage, CACHE_KEY};
use trendmix::utils::ManualClock;
use trendmix::{
    lang_code_or_unknown, Badge, RefreshState, Song, SongImage, TrendingConfig, TrendingError,
    TrendingQuery, TrendingService,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn pool(language: &str, count: usize) -> Vec<Song> {
    (0..count)
        .map(|i| {
            let mut song = Song::new(
                format!("{}-{}", language, i),
                format!("{} track {}", language, i),
            );
            song.language = Some(language.to_string());
            song.play_count = Some(5_000 + (i as u64) * 1_000);
            song.year = Some(2025);
            song.image = Some(SongImage::Url(format!(
                "https://img.example/{}/{}.jpg",
                language, i
            )));
            song
        })
        .collect()
}

/// Source that counts fetches and can be switched to failing
struct CountingSource {
    pools: HashMap<String, Vec<Song>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    failing_language: Option<String>,
    delay: Option<std::time::Duration>,
    panic_on_first_call: bool,
}

impl CountingSource {
    fn new(languages: &[&str], per_language: usize) -> Self {
        Self {
            pools: languages
                .iter()
                .map(|l| (l.to_string(), pool(l, per_language)))
                .collect(),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            failing_language: None,
            delay: None,
            panic_on_first_call: false,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SongSource for CountingSource {
    async fn fetch_trending(&self, language: &str) -> Result<Vec<Song>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_first_call && call == 0 {
            panic!("source bug");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            bail!("catalog unreachable");
        }
        if self.failing_language.as_deref() == Some(language) {
            bail!("catalog returned 500 for {}", language);
        }
        Ok(self.pools.get(language).cloned().unwrap_or_default())
    }
}

fn three_language_config() -> TrendingConfig {
    TrendingConfig {
        languages: vec!["malayalam".into(), "tamil".into(), "hindi".into()],
        ..Default::default()
    }
}

struct Harness {
    service: TrendingService,
    source: Arc<CountingSource>,
    clock: Arc<ManualClock>,
    storage: Arc<MemoryStorage>,
}

fn harness(source: CountingSource) -> Harness {
    let source = Arc::new(source);
    let clock = Arc::new(ManualClock::new(start()));
    let storage = Arc::new(MemoryStorage::new());
    let service = TrendingService::with_clock(
        source.clone(),
        storage.clone(),
        three_language_config(),
        clock.clone(),
    );
    Harness {
        service,
        source,
        clock,
        storage,
    }
}

#[tokio::test]
async fn test_end_to_end_three_pools() {
    let h = harness(CountingSource::new(&["malayalam", "tamil", "hindi"], 20));

    let songs = h
        .service
        .get_trending_songs(TrendingQuery::with_limit(25))
        .await
        .unwrap();

    assert!(!songs.is_empty());
    assert!(songs.len() <= 25);

    let ids: HashSet<&str> = songs.iter().map(|s| s.song.id.as_str()).collect();
    assert_eq!(ids.len(), songs.len());

    let mut per_language: HashMap<String, usize> = HashMap::new();
    for song in &songs {
        *per_language
            .entry(lang_code_or_unknown(song.song.language.as_deref()))
            .or_insert(0) += 1;
    }
    // strict equal split: floor(25 / 3) per language
    assert!(per_language.values().all(|&n| n <= 8));
    assert_eq!(songs.len(), 24);

    assert!(songs.iter().all(|s| {
        matches!(&s.song.image, Some(SongImage::Url(url)) if url.starts_with("https://"))
    }));
    // every pool song is dated this year without a release date
    assert!(songs.iter().all(|s| s.has_badge(Badge::New)));

    let ranks: Vec<usize> = songs.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, (1..=songs.len()).collect::<Vec<_>>());
    assert!(songs.iter().all(|s| s.delta == 0));

    assert_eq!(h.source.calls(), 3);
    assert_eq!(h.service.state(), RefreshState::Cached);
    assert!(!h.service.is_stale());
}

#[tokio::test]
async fn test_cache_ttl_and_stale_fallback() {
    let h = harness(CountingSource::new(&["malayalam", "tamil", "hindi"], 20));
    let query = TrendingQuery::with_limit(25);

    let first = h.service.get_trending_songs(query.clone()).await.unwrap();
    assert_eq!(h.source.calls(), 3);

    // still valid at +9 minutes
    h.clock.advance(Duration::minutes(9));
    let cached = h.service.get_trending_songs(query.clone()).await.unwrap();
    assert_eq!(h.source.calls(), 3);
    assert_eq!(cached, first);
    assert_eq!(h.service.cache_age(), Some(Duration::minutes(9)));

    // stale at +11 minutes: refetch
    h.clock.advance(Duration::minutes(2));
    assert!(h.service.is_stale());
    h.service.get_trending_songs(query.clone()).await.unwrap();
    assert_eq!(h.source.calls(), 6);

    // stale again and the refetch fails: stale data is served
    h.clock.advance(Duration::minutes(11));
    h.source.failing.store(true, Ordering::SeqCst);
    let fallback = h.service.get_trending_songs(query).await.unwrap();
    assert_eq!(h.source.calls(), 9);
    assert!(!fallback.is_empty());
    assert_eq!(h.service.state(), RefreshState::Cached);
}

#[tokio::test]
async fn test_total_failure_without_cache_errors() {
    let source = CountingSource::new(&["malayalam", "tamil", "hindi"], 20);
    source.failing.store(true, Ordering::SeqCst);
    let h = harness(source);

    let err = h
        .service
        .get_trending_songs(TrendingQuery::default())
        .await
        .unwrap_err();
    assert_eq!(err, TrendingError::AllSourcesFailed { attempted: 3 });
    assert_eq!(h.service.state(), RefreshState::Idle);
}

#[tokio::test]
async fn test_single_language_failure_tolerated() {
    let mut source = CountingSource::new(&["malayalam", "tamil", "hindi"], 20);
    source.failing_language = Some("tamil".to_string());
    let h = harness(source);

    let songs = h
        .service
        .get_trending_songs(TrendingQuery::with_limit(24))
        .await
        .unwrap();

    assert_eq!(songs.len(), 16);
    assert!(songs
        .iter()
        .all(|s| s.song.language.as_deref() != Some("tamil")));
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_fetch() {
    let mut source = CountingSource::new(&["malayalam", "tamil", "hindi"], 20);
    source.delay = Some(std::time::Duration::from_millis(50));
    let h = harness(source);

    let query = TrendingQuery::with_limit(12);
    let (a, b) = tokio::join!(
        h.service.get_trending_songs(query.clone()),
        h.service.get_trending_songs(query.force())
    );

    assert_eq!(h.source.calls(), 3);
    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn test_deltas_and_history_across_refreshes() {
    let h = harness(CountingSource::new(&["malayalam", "tamil", "hindi"], 5));
    let query = TrendingQuery::with_limit(15);

    let first = h.service.get_trending_songs(query.clone()).await.unwrap();
    assert_eq!(first.len(), 15);

    h.clock.advance(Duration::minutes(30));
    let second = h.service.get_trending_songs(query.force()).await.unwrap();
    assert_eq!(second.len(), 15);

    let previous_rank: HashMap<&str, usize> =
        first.iter().map(|s| (s.song.id.as_str(), s.rank)).collect();
    for song in &second {
        let before = previous_rank[song.song.id.as_str()];
        assert_eq!(song.delta, before as i64 - song.rank as i64);
    }

    let history = h.service.history_for(&first[0].song.id);
    assert_eq!(history.len(), 2);
    assert_eq!(h.service.last_update_time(), Some(start() + Duration::minutes(30)));
}

#[tokio::test]
async fn test_language_filter_and_limit() {
    let h = harness(CountingSource::new(&["malayalam", "tamil", "hindi"], 20));

    let songs = h
        .service
        .get_trending_songs(TrendingQuery::with_limit(24).languages(["TA"]))
        .await
        .unwrap();
    assert_eq!(songs.len(), 8);
    assert!(songs.iter().all(|s| s.song.language.as_deref() == Some("tamil")));

    let songs = h
        .service
        .get_trending_songs(TrendingQuery::with_limit(3))
        .await
        .unwrap();
    assert_eq!(songs.len(), 3);
    assert_eq!(h.source.calls(), 3);
}

#[tokio::test]
async fn test_cache_survives_restart_and_clears() {
    let h = harness(CountingSource::new(&["malayalam", "tamil", "hindi"], 20));
    h.service
        .get_trending_songs(TrendingQuery::with_limit(25))
        .await
        .unwrap();
    assert!(h.storage.get(CACHE_KEY).unwrap().is_some());

    let source = Arc::new(CountingSource::new(&["malayalam", "tamil", "hindi"], 20));
    let restarted = TrendingService::with_clock(
        source.clone(),
        h.storage.clone(),
        three_language_config(),
        h.clock.clone(),
    );
    assert_eq!(restarted.state(), RefreshState::Cached);
    let songs = restarted
        .get_trending_songs(TrendingQuery::with_limit(25))
        .await
        .unwrap();
    assert_eq!(songs.len(), 24);
    assert_eq!(source.calls(), 0);

    restarted.clear_cache().unwrap();
    assert!(restarted.is_stale());
    assert!(restarted.last_update_time().is_none());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn test_low_quality_candidates_filtered() {
    let mut source = CountingSource::new(&["malayalam", "tamil", "hindi"], 3);
    let tamil = source.pools.get_mut("tamil").unwrap();
    tamil[0].name = "Hit Song (Dubbed)".into();
    tamil[1].play_count = Some(120);
    tamil[2].year = Some(2019);
    let h = harness(source);

    let songs = h
        .service
        .get_trending_songs(TrendingQuery::with_limit(30))
        .await
        .unwrap();
    assert_eq!(songs.len(), 6);
    assert!(songs
        .iter()
        .all(|s| s.song.language.as_deref() != Some("tamil")));
}

#[tokio::test]
async fn test_panicking_refresh_releases_slot() {
    let mut source = CountingSource::new(&["malayalam", "tamil", "hindi"], 20);
    source.panic_on_first_call = true;
    let h = harness(source);

    let service = h.service.clone();
    let first = tokio::spawn(async move {
        service
            .get_trending_songs(TrendingQuery::with_limit(12))
            .await
    })
    .await;
    assert!(first.unwrap_err().is_panic());
    assert_eq!(h.service.state(), RefreshState::Idle);

    // the next call starts a fresh refresh instead of joining the dead one
    let songs = h
        .service
        .get_trending_songs(TrendingQuery::with_limit(12))
        .await
        .unwrap();
    assert_eq!(songs.len(), 12);
    assert_eq!(h.service.state(), RefreshState::Cached);
    assert_eq!(h.source.calls(), 4);
}

#[tokio::test]
async fn test_unbounded_limit() {
    let h = harness(CountingSource::new(&["malayalam", "tamil", "hindi"], 20));

    let songs = h
        .service
        .get_trending_songs(TrendingQuery::with_limit(usize::MAX))
        .await
        .unwrap();
    assert_eq!(songs.len(), 60);

    let ids: HashSet<&str> = songs.iter().map(|s| s.song.id.as_str()).collect();
    assert_eq!(ids.len(), 60);
}
