//! Song sources
//!
//! The orchestrator asks a [`SongSource`] for one candidate pool per language. Catalog HTTP
//! clients live outside this crate and plug in through the trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::models::Song;

/// Supplies trending candidates for a language
#[async_trait]
pub trait SongSource: Send + Sync {
    /// Fetch the candidate pool for `language` (a name from the config, e.g. "tamil")
    async fn fetch_trending(&self, language: &str) -> Result<Vec<Song>>;
}

/// Reads pools from `<dir>/<language>.json`, each a JSON array of songs
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SongSource for JsonDirSource {
    async fn fetch_trending(&self, language: &str) -> Result<Vec<Song>> {
        let path = self.dir.join(format!("{}.json", language.to_lowercase()));
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read pool file {}", path.display()))?;
        let songs: Vec<Song> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse pool file {}", path.display()))?;
        debug!("Loaded {} songs for {} from {}", songs.len(), language, path.display());
        Ok(songs)
    }
}

/// Fixed pools held in memory. Languages without a pool fail like an unreachable catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pools: HashMap<String, Vec<Song>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, language: &str, songs: Vec<Song>) -> Self {
        self.pools.insert(language.to_lowercase(), songs);
        self
    }
}

#[async_trait]
impl SongSource for StaticSource {
    async fn fetch_trending(&self, language: &str) -> Result<Vec<Song>> {
        self.pools
            .get(&language.to_lowercase())
            .cloned()
            .with_context(|| format!("No pool for language '{}'", language))
    }
}
