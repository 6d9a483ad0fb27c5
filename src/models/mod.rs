//! Data models for trendmix
//!
//! Songs come in from catalog sources; trending songs, history snapshots and the cached list
//! are derived from them.

mod song;
mod trending;

pub use song::{ImageLink, Song, SongAlbum, SongImage, SongMetadata};
pub use trending::{Badge, CachedTrending, SongHistory, TrendingSong};

/// Common view over anything that carries a song identity
pub trait SongLike {
    fn song_id(&self) -> &str;
    fn song_name(&self) -> &str;
    fn song_language(&self) -> Option<&str>;
}

impl SongLike for Song {
    fn song_id(&self) -> &str {
        &self.id
    }

    fn song_name(&self) -> &str {
        &self.name
    }

    fn song_language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl SongLike for TrendingSong {
    fn song_id(&self) -> &str {
        &self.song.id
    }

    fn song_name(&self) -> &str {
        &self.song.name
    }

    fn song_language(&self) -> Option<&str> {
        self.song.language.as_deref()
    }
}
