//! Language classification
//!
//! Maps free-text catalog languages to short uppercase codes.

use lazy_static::lazy_static;
use regex::Regex;

/// Code used when a language is present but cannot be classified
pub const UNKNOWN_LANG: &str = "UN";

/// Known languages: (name fragment, two-letter alias, code)
const KNOWN_LANGUAGES: &[(&str, &str, &str)] = &[
    ("malayalam", "ml", "ML"),
    ("tamil", "ta", "TA"),
    ("hindi", "hi", "HI"),
    ("english", "en", "EN"),
    ("telugu", "te", "TE"),
    ("kannada", "kn", "KN"),
    ("punjabi", "pa", "PB"),
];

lazy_static! {
    static ref BARE_CODE: Regex = Regex::new(r"\b([A-Za-z]{2})\b").unwrap();
}

/// Classify a language, distinguishing "no information" from "unrecognised".
///
/// Returns `None` for missing or blank input, and for input that neither names a known
/// language nor contains a bare two-letter token.
pub fn lang_code(language: Option<&str>) -> Option<String> {
    let raw = language?.trim();
    if raw.is_empty() {
        return None;
    }

    let lower = raw.to_lowercase();
    for (name, alias, code) in KNOWN_LANGUAGES {
        if lower.contains(name) || lower == *alias || lower == code.to_lowercase() {
            return Some((*code).to_string());
        }
    }

    BARE_CODE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/// Classify a language, defaulting to [`UNKNOWN_LANG`] for anything unclassifiable
pub fn lang_code_or_unknown(language: Option<&str>) -> String {
    lang_code(language).unwrap_or_else(|| UNKNOWN_LANG.to_string())
}
