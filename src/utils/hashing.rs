//! Hashing utilities

use xxhash_rust::xxh3::xxh3_64;

/// Lowercase, transliterate and drop everything that is not alphanumeric.
///
/// "Kannaadi (From \"Movie\")" and "kannaadi from movie" normalize to the same string.
pub fn normalize_name(name: &str) -> String {
    let decoded = deunicode::deunicode(name);
    decoded
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Short hash of a normalized song name, or `None` when nothing alphanumeric remains
pub fn name_hash(name: &str) -> Option<String> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return None;
    }
    let hash = xxh3_64(normalized.as_bytes());
    Some(format!("{:016x}", hash)[..11].to_string())
}
