//! Quality filters applied to trending candidates

use chrono::{DateTime, Utc};

use crate::config::TrendingConfig;
use crate::models::Song;
use crate::utils::dates::{current_year, days_since};
use crate::utils::images::normalize_song_image;

/// URL fragments of catalog placeholder artwork
const PLACEHOLDER_MARKERS: &[&str] = &["placeholder", "default", "no-image", "noimage", "blank"];

/// Why a candidate was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    NoImage,
    PlaceholderImage,
    TooOld,
    LowQualityName,
    LowPlayCount,
}

/// Check a candidate against every filter, returning its resolved image on success
pub fn check_candidate(
    song: &Song,
    config: &TrendingConfig,
    now: DateTime<Utc>,
) -> Result<String, Rejection> {
    let image = normalize_song_image(song).ok_or(Rejection::NoImage)?;
    if is_placeholder_image(&image) {
        return Err(Rejection::PlaceholderImage);
    }
    if is_too_old(song, config.max_age_years, now) {
        return Err(Rejection::TooOld);
    }
    if has_low_quality_marker(&song.name, &config.low_quality_markers) {
        return Err(Rejection::LowQualityName);
    }
    if is_low_play_count(song, config.min_play_count) {
        return Err(Rejection::LowPlayCount);
    }
    Ok(image)
}

/// A cover that is not a web URL, or points at placeholder artwork
pub fn is_placeholder_image(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return true;
    }
    PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m))
}

/// Released more than `max_age_years` ago. Songs without any date are kept.
pub fn is_too_old(song: &Song, max_age_years: i32, now: DateTime<Utc>) -> bool {
    if let Some(date) = song.release_day() {
        return days_since(date, now) > i64::from(max_age_years) * 365;
    }
    match song.year {
        Some(year) => current_year(now) - year > max_age_years,
        None => false,
    }
}

/// Name contains one of the configured low-quality markers
pub fn has_low_quality_marker(name: &str, markers: &[String]) -> bool {
    let lower = name.to_lowercase();
    markers
        .iter()
        .any(|m| !m.is_empty() && lower.contains(&m.to_lowercase()))
}

/// Known, positive play count below the threshold
pub fn is_low_play_count(song: &Song, min_play_count: u64) -> bool {
    matches!(song.play_count, Some(plays) if plays > 0 && plays < min_play_count)
}
