//! Trending output and history models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Song;

/// Qualitative label attached to a trending song
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Badge {
    Hot,
    Rising,
    New,
}

impl Badge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::Hot => "HOT",
            Badge::Rising => "RISING",
            Badge::New => "NEW",
        }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A song with its computed trending data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingSong {
    #[serde(flatten)]
    pub song: Song,
    pub score: f64,
    /// 1-based position in the final ordered list
    pub rank: usize,
    /// Positions gained since the previous list (negative when dropping)
    pub delta: i64,
    /// Relative play-count growth, within [-1, 5]
    pub velocity: f64,
    #[serde(default)]
    pub badges: BTreeSet<Badge>,
    pub last_updated: DateTime<Utc>,
}

impl TrendingSong {
    /// Wrap a scored song. Rank and delta are assigned later by the delta pass.
    pub fn new(
        song: Song,
        score: f64,
        velocity: f64,
        badges: BTreeSet<Badge>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            song,
            score,
            rank: 0,
            delta: 0,
            velocity,
            badges,
            last_updated,
        }
    }

    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }
}

/// One play-count observation of a song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongHistory {
    pub song_id: String,
    pub play_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// The persisted trending list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedTrending {
    pub songs: Vec<TrendingSong>,
    pub timestamp: DateTime<Utc>,
    pub version: u32,
}
