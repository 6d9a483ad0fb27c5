//! Rank assignment and rank-change deltas

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{SongLike, TrendingSong};

/// Assign ranks to `current` and compute movement against `previous`.
///
/// Rank is always position + 1. Delta is previous rank minus current rank, so a song that
/// climbed has a positive delta; songs missing from `previous` get 0.
pub fn calculate_deltas(current: &[TrendingSong], previous: &[TrendingSong]) -> Vec<TrendingSong> {
    let previous_ranks: HashMap<&str, usize> = previous
        .iter()
        .enumerate()
        .rev()
        .map(|(i, s)| (s.song_id(), i + 1))
        .collect();

    current
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let rank = i + 1;
            let delta = previous_ranks
                .get(song.song_id())
                .map(|&prev| prev as i64 - rank as i64)
                .unwrap_or(0);

            TrendingSong {
                rank,
                delta,
                ..song.clone()
            }
        })
        .collect()
}

/// Direction of a rank change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaTrend {
    Up,
    Down,
    Same,
}

impl DeltaTrend {
    /// Style token for the UI
    pub fn style(&self) -> &'static str {
        match self {
            DeltaTrend::Up => "delta-up",
            DeltaTrend::Down => "delta-down",
            DeltaTrend::Same => "delta-same",
        }
    }
}

/// Display form of a delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeltaDisplay {
    pub text: String,
    pub icon: &'static str,
    pub trend: DeltaTrend,
}

/// Format a delta as `+N ▲`, `-N ▼` or `— —`
pub fn format_delta(delta: i64) -> DeltaDisplay {
    match delta {
        d if d > 0 => DeltaDisplay {
            text: format!("+{}", d),
            icon: "▲",
            trend: DeltaTrend::Up,
        },
        d if d < 0 => DeltaDisplay {
            text: d.to_string(),
            icon: "▼",
            trend: DeltaTrend::Down,
        },
        _ => DeltaDisplay {
            text: "—".to_string(),
            icon: "—",
            trend: DeltaTrend::Same,
        },
    }
}
