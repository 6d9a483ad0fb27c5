//! Song model
//!
//! Songs arrive from external catalogs with loosely typed fields: play counts as numbers or
//! strings, years as numbers or strings, images in half a dozen shapes. Everything is coerced
//! here, at the boundary, so the rest of the crate works with plain Rust types.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utils::dates::parse_release_date;

/// A song record as delivered by a catalog source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Catalog id, the sole identity of a song. Empty when the source omitted it.
    #[serde(default, deserialize_with = "de::lenient_id")]
    pub id: String,
    /// Display name
    #[serde(default, alias = "title")]
    pub name: String,
    /// Free-text language ("Malayalam", "ta", ...)
    #[serde(default)]
    pub language: Option<String>,
    /// Play count as reported by the catalog
    #[serde(default, alias = "play_count", deserialize_with = "de::lenient_u64")]
    pub play_count: Option<u64>,
    /// Release year
    #[serde(default, deserialize_with = "de::lenient_year")]
    pub year: Option<i32>,
    /// ISO release date
    #[serde(default, alias = "release_date")]
    pub release_date: Option<String>,
    /// Primary image field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<SongImage>,
    /// Alternate image field used by some catalogs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<SongImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<SongImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SongMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<SongAlbum>,
    /// Engagement counters, absent on most catalogs
    #[serde(default, deserialize_with = "de::lenient_u64", skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, deserialize_with = "de::lenient_u64", skip_serializing_if = "Option::is_none")]
    pub saves: Option<u64>,
    /// Chart position reported by the catalog (0-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Image field in any of the shapes catalogs use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SongImage {
    /// A single URL
    Url(String),
    /// Several URLs of unknown quality
    Urls(Vec<String>),
    /// `[{"quality": "500x500", "link": "..."}]`
    Qualities(Vec<ImageLink>),
    /// `{"large": "...", "small": "..."}`
    Keyed(serde_json::Map<String, Value>),
    /// Anything else; never resolves to a URL
    Other(Value),
}

/// One entry of a quality-tagged image list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageLink {
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default, alias = "url")]
    pub link: Option<String>,
}

/// Nested metadata block carried by some catalogs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongMetadata {
    #[serde(default)]
    pub image: Option<SongImage>,
    #[serde(default)]
    pub thumbnail: Option<SongImage>,
}

/// Album reference embedded in a song
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongAlbum {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<SongImage>,
}

impl Song {
    /// Create a song with just an id and name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the record carries a usable identity
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Play count with missing treated as zero
    pub fn plays(&self) -> u64 {
        self.play_count.unwrap_or(0)
    }

    /// Parsed release date, if the catalog supplied one we can read
    pub fn release_day(&self) -> Option<NaiveDate> {
        self.release_date.as_deref().and_then(parse_release_date)
    }

    /// Release year from the release date, falling back to the year field
    pub fn release_year(&self) -> Option<i32> {
        self.release_day().map(|d| d.year()).or(self.year)
    }
}

mod de {
    use super::*;

    pub(super) fn number_from_value(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(number_from_value)
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64))
    }

    pub fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let year = match value {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| f as i64)
                })
                .and_then(|y| i32::try_from(y).ok()),
            Some(Value::String(s)) => {
                let digits: String = s.trim().chars().take(4).collect();
                digits.parse::<i32>().ok()
            }
            _ => None,
        };
        Ok(year.filter(|y| *y > 0))
    }

    pub fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }
}
