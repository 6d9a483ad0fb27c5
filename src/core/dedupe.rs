//! Duplicate removal for song lists

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{Song, SongLike};
use crate::utils::hashing::name_hash;

/// Remove repeated ids, keeping the last record for each id.
///
/// Each id stays at the position of its first occurrence. Records without an id are dropped.
pub fn dedupe_by_id<T: SongLike + Clone>(songs: &[T]) -> Vec<T> {
    collapse_by_id(songs, |_, _| true)
}

/// Collapse repeated ids, keeping the record with more plays (more recent release on ties)
pub fn merge_duplicates(songs: &[Song]) -> Vec<Song> {
    collapse_by_id(songs, |kept, candidate| {
        compare_quality(candidate, kept) == Ordering::Greater
    })
}

/// Drop songs whose normalized name matches an earlier song, even under a different id
pub fn dedupe_by_name<T: SongLike + Clone>(songs: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    songs
        .iter()
        .filter(|s| match name_hash(s.song_name()) {
            Some(key) => seen.insert(key),
            None => true,
        })
        .cloned()
        .collect()
}

/// Full pass used by the orchestrator: merge by id, then by normalized name
pub fn dedupe_songs(songs: &[Song]) -> Vec<Song> {
    dedupe_by_name(&merge_duplicates(songs))
}

fn collapse_by_id<T, F>(songs: &[T], replace: F) -> Vec<T>
where
    T: SongLike + Clone,
    F: Fn(&T, &T) -> bool,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::with_capacity(songs.len());

    for song in songs {
        let id = song.song_id().trim();
        if id.is_empty() {
            continue;
        }
        match index.get(id) {
            Some(&pos) => {
                if replace(&out[pos], song) {
                    out[pos] = song.clone();
                }
            }
            None => {
                index.insert(id, out.len());
                out.push(song.clone());
            }
        }
    }

    out
}

/// Orders songs by play count, then by release date
fn compare_quality(a: &Song, b: &Song) -> Ordering {
    a.plays()
        .cmp(&b.plays())
        .then_with(|| a.release_day().cmp(&b.release_day()))
}
