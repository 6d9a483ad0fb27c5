//! Trending configuration
//!
//! Score weights, badge thresholds and the orchestrator's quality filters. Stored as JSON when
//! persisted; every field has a default so partial files load cleanly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weights of the five score components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// w1: log-scaled play count
    pub absolute: f64,
    /// w2: positive velocity
    pub velocity: f64,
    /// w3: likes and saves
    pub engagement: f64,
    /// w4: release recency
    pub recency: f64,
    /// w5: catalog chart position, only for songs without plays
    pub position: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            absolute: 1.0,
            velocity: 2.0,
            engagement: 0.5,
            recency: 1.5,
            position: 1.0,
        }
    }
}

/// Badge thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BadgeThresholds {
    /// Minimum score for HOT
    pub hot: f64,
    /// Minimum velocity for RISING
    pub rising: f64,
    /// Maximum age in days for NEW
    pub new_days: i64,
}

impl Default for BadgeThresholds {
    fn default() -> Self {
        Self {
            hot: 12.0,
            rising: 0.5,
            new_days: 14,
        }
    }
}

/// Trending configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    #[serde(default)]
    pub thresholds: BadgeThresholds,

    /// Year treated as "new" for songs without a release date; `None` means the current year
    #[serde(default)]
    pub target_year: Option<i32>,

    /// Language pools to fetch, in interleave order
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Songs with a known, positive play count below this are dropped as too obscure
    #[serde(default = "default_min_play_count")]
    pub min_play_count: u64,

    /// Songs released more than this many years ago are dropped
    #[serde(default = "default_max_age_years")]
    pub max_age_years: i32,

    /// Case-insensitive name fragments that mark low-quality uploads
    #[serde(default = "default_low_quality_markers")]
    pub low_quality_markers: Vec<String>,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            thresholds: BadgeThresholds::default(),
            target_year: None,
            languages: default_languages(),
            min_play_count: default_min_play_count(),
            max_age_years: default_max_age_years(),
            low_quality_markers: default_low_quality_markers(),
        }
    }
}

impl TrendingConfig {
    /// Load configuration from a JSON file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: TrendingConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply a change in place
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        f(self);
    }

    /// Reject configurations the orchestrator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            anyhow::bail!("at least one language pool is required");
        }
        if self.thresholds.new_days < 0 {
            anyhow::bail!("newDays must not be negative");
        }
        Ok(())
    }
}

fn default_languages() -> Vec<String> {
    ["malayalam", "tamil", "hindi", "english"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_play_count() -> u64 {
    1000
}

fn default_max_age_years() -> i32 {
    2
}

fn default_low_quality_markers() -> Vec<String> {
    [
        "reupload",
        "re-upload",
        "dubbed",
        "remix version",
        "(old)",
        "(remastered)",
        "lyric video",
        "lyrical video",
        "official audio",
        "visualizer",
        "8d audio",
        "slowed",
        "karaoke",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
