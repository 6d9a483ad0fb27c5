//! Error types for the trending engine

use thiserror::Error;

/// Result type for trending operations
pub type Result<T> = std::result::Result<T, TrendingError>;

/// Errors surfaced by the trending engine.
///
/// Cloneable so one in-flight refresh can hand the same outcome to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrendingError {
    /// Every language pool failed to fetch and there was nothing to fall back to
    #[error("all {attempted} song sources failed")]
    AllSourcesFailed { attempted: usize },

    /// Durable storage could not be read or written
    #[error("storage error: {0}")]
    Storage(String),

    /// Persisted or incoming data could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for TrendingError {
    fn from(err: std::io::Error) -> Self {
        TrendingError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for TrendingError {
    fn from(err: serde_json::Error) -> Self {
        TrendingError::Serialization(err.to_string())
    }
}
