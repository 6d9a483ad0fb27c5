//! Utility modules for trendmix

pub mod dates;
pub mod hashing;
pub mod images;
pub mod language;

pub use dates::{Clock, ManualClock, SystemClock};
pub use images::{best_image, normalize_song_image};
pub use language::{lang_code, lang_code_or_unknown, UNKNOWN_LANG};
