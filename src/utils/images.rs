//! Image URL selection
//!
//! Catalogs ship artwork as a bare URL, a list of URLs, a list of quality-tagged links or a
//! keyed object. These helpers reduce all of them to the single best URL.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{ImageLink, Song, SongImage};

/// Keys checked, in order, on keyed image objects
const KEY_PRIORITY: &[&str] = &[
    "original",
    "large",
    "1000x1000",
    "high",
    "medium",
    "small",
    "thumbnail",
    "default",
];

static DIMENSIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*[xX]\s*(\d+)").unwrap());

/// Pick the best URL out of an image field
pub fn best_image(raw: &SongImage) -> Option<String> {
    match raw {
        SongImage::Url(url) => non_empty(url),
        SongImage::Qualities(links) => best_quality_link(links),
        SongImage::Urls(urls) => urls
            .iter()
            .filter(|u| !u.trim().is_empty())
            .fold(None::<&String>, |best, u| match best {
                Some(b) if b.len() >= u.len() => Some(b),
                _ => Some(u),
            })
            .cloned(),
        SongImage::Keyed(map) => {
            for key in KEY_PRIORITY {
                if let Some(Value::String(url)) = map.get(*key) {
                    if !url.trim().is_empty() {
                        return Some(url.clone());
                    }
                }
            }
            map.values().find_map(|v| match v {
                Value::String(url) if !url.trim().is_empty() => Some(url.clone()),
                _ => None,
            })
        }
        SongImage::Other(_) => None,
    }
}

/// Score a quality tag like "500x500". Square-ish artwork counts double; absurd dimensions
/// saturate instead of overflowing.
pub fn quality_score(quality: &str) -> u64 {
    let Some(caps) = DIMENSIONS.captures(quality) else {
        return 0;
    };
    let width: u64 = caps[1].parse().unwrap_or(0);
    let height: u64 = caps[2].parse().unwrap_or(0);
    if width == 0 || height == 0 {
        return 0;
    }

    let area = width.saturating_mul(height);
    let ratio = width as f64 / height as f64;
    if (0.9..=1.1).contains(&ratio) {
        area.saturating_mul(2)
    } else {
        area
    }
}

fn best_quality_link(links: &[ImageLink]) -> Option<String> {
    let mut candidates: Vec<(u64, &str)> = links
        .iter()
        .filter_map(|l| {
            let link = l.link.as_deref().filter(|s| !s.trim().is_empty())?;
            let score = l.quality.as_deref().map(quality_score).unwrap_or(0);
            Some((score, link))
        })
        .collect();

    // stable sort keeps catalog order between equal scores
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates.first().map(|(_, link)| link.to_string())
}

/// Resolve the best image for a song, probing every field catalogs are known to use
pub fn normalize_song_image(song: &Song) -> Option<String> {
    let metadata = song.metadata.as_ref();
    let candidates = [
        song.image.as_ref(),
        song.images.as_ref(),
        song.thumbnail.as_ref(),
        metadata.and_then(|m| m.image.as_ref()),
        metadata.and_then(|m| m.thumbnail.as_ref()),
        song.album.as_ref().and_then(|a| a.image.as_ref()),
    ];

    candidates.into_iter().flatten().find_map(best_image)
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SongAlbum, SongMetadata};
    use serde_json::json;

    fn image(value: Value) -> SongImage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(
            best_image(&image(json!("http://a/x.jpg"))).as_deref(),
            Some("http://a/x.jpg")
        );
        assert_eq!(best_image(&image(json!(""))), None);
    }

    #[test]
    fn test_quality_links() {
        let raw = image(json!([
            {"quality": "150x150", "link": "A"},
            {"quality": "1000x1000", "link": "B"}
        ]));
        assert_eq!(best_image(&raw).as_deref(), Some("B"));
    }

    #[test]
    fn test_square_preferred_over_wide_banner() {
        // 1200x300 = 360k, 500x500 = 250k doubled to 500k
        let raw = image(json!([
            {"quality": "1200x300", "link": "banner"},
            {"quality": "500x500", "link": "cover"}
        ]));
        assert_eq!(best_image(&raw).as_deref(), Some("cover"));
    }

    #[test]
    fn test_quality_links_without_link() {
        let raw = image(json!([{"quality": "500x500"}, {"quality": "50x50"}]));
        assert_eq!(best_image(&raw), None);

        let raw = image(json!([{"quality": "high", "link": "only"}]));
        assert_eq!(best_image(&raw).as_deref(), Some("only"));
    }

    #[test]
    fn test_longest_string() {
        let raw = image(json!(["http://a/x.jpg", "http://a/very-long-name.jpg"]));
        assert_eq!(
            best_image(&raw).as_deref(),
            Some("http://a/very-long-name.jpg")
        );
    }

    #[test]
    fn test_keyed_object() {
        let raw = image(json!({"small": "s", "large": "l"}));
        assert_eq!(best_image(&raw).as_deref(), Some("l"));

        let raw = image(json!({"count": 3, "cover": "c", "alt": "a"}));
        assert_eq!(best_image(&raw).as_deref(), Some("c"));

        let raw = image(json!({"count": 3}));
        assert_eq!(best_image(&raw), None);
    }

    #[test]
    fn test_unsupported_shape() {
        assert_eq!(best_image(&image(json!(12))), None);
    }

    #[test]
    fn test_quality_score() {
        assert_eq!(quality_score("100x100"), 20_000);
        assert_eq!(quality_score("200x100"), 20_000);
        assert_eq!(quality_score("hd"), 0);
    }

    #[test]
    fn test_quality_score_huge_dimensions() {
        assert_eq!(quality_score("4294967295x4294967295"), u64::MAX);
        assert_eq!(quality_score("99999999999x99999999999"), u64::MAX);
        // too long for u64 at all
        assert_eq!(quality_score("999999999999999999999x2"), 0);

        let raw = image(json!([
            {"quality": "500x500", "link": "cover"},
            {"quality": "4294967295x4294967295", "link": "huge"}
        ]));
        assert_eq!(best_image(&raw).as_deref(), Some("huge"));
    }

    #[test]
    fn test_normalize_song_image_fallback_order() {
        let mut song = Song::new("1", "x");
        assert_eq!(normalize_song_image(&song), None);

        song.album = Some(SongAlbum {
            name: None,
            image: Some(SongImage::Url("album".into())),
        });
        assert_eq!(normalize_song_image(&song).as_deref(), Some("album"));

        song.metadata = Some(SongMetadata {
            image: None,
            thumbnail: Some(SongImage::Url("meta-thumb".into())),
        });
        assert_eq!(normalize_song_image(&song).as_deref(), Some("meta-thumb"));

        song.image = Some(SongImage::Urls(vec![]));
        song.images = Some(SongImage::Url("images".into()));
        assert_eq!(normalize_song_image(&song).as_deref(), Some("images"));
    }
}
