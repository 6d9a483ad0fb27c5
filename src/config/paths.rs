//! Path management for trendmix
//!
//! Resolves where the cache/history files and the config file live.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Filesystem locations used by the application
#[derive(Debug, Clone)]
pub struct Paths {
    data_dir: PathBuf,
}

impl Paths {
    /// Resolve paths, honouring an explicit data directory override, and create the directories
    pub fn new(data_override: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_override {
            Some(path) => path,
            None => directories::ProjectDirs::from("", "", "trendmix")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".trendmix")),
        };

        let paths = Self { data_dir };
        paths.create_directories()?;
        Ok(paths)
    }

    fn create_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.store_dir()).with_context(|| {
            format!("Failed to create data directory {}", self.data_dir.display())
        })?;
        Ok(())
    }

    /// Root data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding the persisted cache and history keys
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    /// Default config file location
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("trending.json")
    }
}
