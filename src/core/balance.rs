//! Language balancing
//!
//! Splits a slot budget evenly across allowed languages. The remainder goes to the languages
//! with the most candidates (ties: ML, TA, HI, then given order). Unused slots are backfilled
//! from leftover songs, then from songs in other languages.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::models::SongLike;
use crate::utils::language::lang_code_or_unknown;

/// Tie-break order when two languages have the same number of candidates
const QUOTA_PRIORITY: &[&str] = &["ML", "TA", "HI"];

/// Per-language slot quotas, in the order of `allowed_langs`
pub fn language_quotas<T, L>(
    songs: &[T],
    allowed_langs: &[L],
    total_slots: usize,
) -> Vec<(String, usize)>
where
    T: SongLike,
    L: AsRef<str>,
{
    let langs = normalize_langs(allowed_langs);
    let buckets = bucket_by_language(songs, &langs);
    let sizes: Vec<usize> = buckets.languages.iter().map(Vec::len).collect();
    let quotas = compute_quotas(&langs, &sizes, total_slots);
    langs.into_iter().zip(quotas).collect()
}

/// Balance `songs` across `allowed_langs`, returning at most `total_slots` songs with unique ids
pub fn balance_by_language<T, L>(songs: &[T], allowed_langs: &[L], total_slots: usize) -> Vec<T>
where
    T: SongLike + Clone,
    L: AsRef<str>,
{
    if total_slots == 0 {
        return Vec::new();
    }

    let langs = normalize_langs(allowed_langs);
    let buckets = bucket_by_language(songs, &langs);
    let sizes: Vec<usize> = buckets.languages.iter().map(Vec::len).collect();
    let quotas = compute_quotas(&langs, &sizes, total_slots);

    let mut picked: Vec<&T> = Vec::with_capacity(total_slots.min(songs.len()));
    let mut taken = vec![0usize; langs.len()];

    // quota fill, in the caller's language order
    for (i, bucket) in buckets.languages.iter().enumerate() {
        let take = quotas[i].min(bucket.len());
        picked.extend_from_slice(&bucket[..take]);
        taken[i] = take;
    }

    // backfill from leftovers, then from other languages
    let leftovers = buckets
        .languages
        .iter()
        .zip(&taken)
        .flat_map(|(bucket, &skip)| bucket[skip..].iter().copied())
        .chain(buckets.others.iter().copied());
    for song in leftovers {
        if picked.len() >= total_slots {
            break;
        }
        picked.push(song);
    }

    let mut seen = HashSet::new();
    picked
        .into_iter()
        .filter(|s| {
            let id = s.song_id().trim();
            !id.is_empty() && seen.insert(id.to_string())
        })
        .cloned()
        .collect()
}

struct Buckets<'a, T> {
    languages: Vec<Vec<&'a T>>,
    others: Vec<&'a T>,
}

fn bucket_by_language<'a, T: SongLike>(songs: &'a [T], langs: &[String]) -> Buckets<'a, T> {
    let mut buckets = Buckets {
        languages: vec![Vec::new(); langs.len()],
        others: Vec::new(),
    };

    for song in songs {
        let code = lang_code_or_unknown(song.song_language());
        match langs.iter().position(|l| *l == code) {
            Some(i) => buckets.languages[i].push(song),
            None => buckets.others.push(song),
        }
    }

    buckets
}

fn normalize_langs<L: AsRef<str>>(allowed_langs: &[L]) -> Vec<String> {
    let mut langs: Vec<String> = Vec::with_capacity(allowed_langs.len());
    for lang in allowed_langs {
        let code = lang_code_or_unknown(Some(lang.as_ref()));
        if !langs.contains(&code) {
            langs.push(code);
        }
    }
    langs
}

fn compute_quotas(langs: &[String], sizes: &[usize], total_slots: usize) -> Vec<usize> {
    if langs.is_empty() {
        return Vec::new();
    }

    let base = total_slots / langs.len();
    let remainder = total_slots - base * langs.len();

    let mut order: Vec<usize> = (0..langs.len()).collect();
    order.sort_by_key(|&i| {
        let priority = QUOTA_PRIORITY
            .iter()
            .position(|p| *p == langs[i])
            .unwrap_or(QUOTA_PRIORITY.len());
        (Reverse(sizes[i]), priority, i)
    });

    let mut quotas = vec![base; langs.len()];
    for &i in order.iter().take(remainder) {
        quotas[i] += 1;
    }
    quotas
}
