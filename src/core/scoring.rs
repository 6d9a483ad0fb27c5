//! Trend scoring and badge assignment
//!
//! Score = ln(1 + plays)·w1 + max(0, velocity)·w2 + ln(1 + likes + saves)·w3
//!       + recency·w4 + position·w5
//!
//! All functions take `now` explicitly so results are reproducible.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::config::TrendingConfig;
use crate::models::{Badge, Song, SongHistory};
use crate::utils::dates::{current_year, days_since};

/// Velocity assumed for a song seen for the first time with some plays
pub const DEFAULT_VELOCITY: f64 = 0.3;

pub const MIN_VELOCITY: f64 = -1.0;
pub const MAX_VELOCITY: f64 = 5.0;

/// Result of scoring one song
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendScore {
    pub score: f64,
    pub velocity: f64,
}

/// Compute the composite trend score and velocity of a song
pub fn compute_trend_score(
    song: &Song,
    history: &[SongHistory],
    config: &TrendingConfig,
    now: DateTime<Utc>,
) -> TrendScore {
    let weights = &config.weights;
    let plays = song.plays();

    let absolute = (1.0 + plays as f64).ln() * weights.absolute;

    let velocity = compute_velocity(plays, history);
    let velocity_component = velocity.max(0.0) * weights.velocity;

    let engagement_total = song
        .likes
        .unwrap_or(0)
        .saturating_add(song.saves.unwrap_or(0));
    let engagement = (1.0 + engagement_total as f64).ln() * weights.engagement;

    let recency = recency_factor(song, now) * weights.recency;

    let position = match song.position {
        Some(pos) if plays == 0 => (1.0 / (pos as f64 + 1.0)) * weights.position,
        _ => 0.0,
    };

    TrendScore {
        score: absolute + velocity_component + engagement + recency + position,
        velocity,
    }
}

/// Relative growth between the two most recent snapshots, clamped to [-1, 5]
pub fn compute_velocity(plays: u64, history: &[SongHistory]) -> f64 {
    let raw = if history.len() >= 2 {
        let mut ordered: Vec<&SongHistory> = history.iter().collect();
        ordered.sort_by_key(|h| h.timestamp);
        let latest = ordered[ordered.len() - 1].play_count as f64;
        let prev = ordered[ordered.len() - 2].play_count as f64;

        if prev > 0.0 {
            (latest - prev) / prev
        } else if latest > 0.0 {
            1.0
        } else {
            0.0
        }
    } else if plays > 0 {
        DEFAULT_VELOCITY
    } else {
        0.0
    };

    raw.clamp(MIN_VELOCITY, MAX_VELOCITY)
}

/// 2 for songs released this year, 1 for last year, 0 otherwise
pub fn recency_factor(song: &Song, now: DateTime<Utc>) -> f64 {
    let this_year = current_year(now);
    match song.release_year() {
        Some(year) if year == this_year => 2.0,
        Some(year) if year == this_year - 1 => 1.0,
        _ => 0.0,
    }
}

/// Derive HOT / RISING / NEW badges
pub fn determine_badges(
    song: &Song,
    score: f64,
    velocity: f64,
    config: &TrendingConfig,
    now: DateTime<Utc>,
) -> BTreeSet<Badge> {
    let mut badges = BTreeSet::new();

    if score >= config.thresholds.hot {
        badges.insert(Badge::Hot);
    }
    if velocity >= config.thresholds.rising {
        badges.insert(Badge::Rising);
    }

    let target_year = config.target_year.unwrap_or_else(|| current_year(now));
    if is_new_song(song, config.thresholds.new_days, target_year, now) {
        badges.insert(Badge::New);
    }

    badges
}

/// Whether a song counts as newly released.
///
/// With a release date: released within the last `new_days` days (not in the future).
/// Without one: its year equals `target_year`.
pub fn is_new_song(song: &Song, new_days: i64, target_year: i32, now: DateTime<Utc>) -> bool {
    match song.release_day() {
        Some(date) => (0..=new_days).contains(&days_since(date, now)),
        None => song.year == Some(target_year),
    }
}
