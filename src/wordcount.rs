//! Word tokenization, bucket routing and count formatting.
//!
//! A word is a maximal run of ASCII letters, folded to lowercase. Every
//! other byte separates words.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};
use fnv::FnvHashMap;
use itertools::Itertools;

use crate::{Error, Result};

/// Occurrence counts keyed by word.
pub type WordCounts = FnvHashMap<Bytes, u64>;

/// Splits `text` into lowercase words, lazily.
pub fn tokenize(text: &[u8]) -> impl Iterator<Item = Vec<u8>> + '_ {
    text.split(|b| !b.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
        .map(<[u8]>::to_ascii_lowercase)
}

/// Reduce bucket of `word`: its first letter's offset from `a`, modulo
/// `n_buckets`.
///
/// `a` goes to bucket 0, `b` to bucket 1 (when there is one), and so on.
pub fn bucket_for(word: &[u8], n_buckets: u32) -> u32 {
    debug_assert!(n_buckets > 0);
    let first = word.first().map_or(b'a', u8::to_ascii_lowercase);
    u32::from(first.saturating_sub(b'a')) % n_buckets
}

/// Adds one occurrence per non-empty line of `data` to `counts`.
///
/// Keys are slices of `data`, so no word is copied.
pub fn count_lines(data: &Bytes, counts: &mut WordCounts) -> u64 {
    let mut seen = 0;
    let mut start = 0;
    for end in newlines(data) {
        if end > start {
            *counts.entry(data.slice(start..end)).or_insert(0) += 1;
            seen += 1;
        }
        start = end + 1;
    }
    if start < data.len() {
        *counts.entry(data.slice(start..)).or_insert(0) += 1;
        seen += 1;
    }
    seen
}

fn newlines(data: &[u8]) -> impl Iterator<Item = usize> + '_ {
    data.iter()
        .enumerate()
        .filter_map(|(i, b)| (*b == b'\n').then_some(i))
}

/// Formats `counts` as `<word> <count>` lines, sorted by word.
pub fn render_counts(counts: &WordCounts) -> Bytes {
    let mut out = BytesMut::with_capacity(counts.len() * 12);
    for (word, count) in counts.iter().sorted_unstable_by(|a, b| a.0.cmp(b.0)) {
        out.put_slice(word);
        out.put(format!(" {count}\n").as_bytes());
    }
    out.freeze()
}

/// Parses `<word> <count>` lines back into a map.
pub fn parse_output(data: &[u8]) -> Result<BTreeMap<String, u64>> {
    let text = String::from_utf8_lossy(data);
    let mut counts = BTreeMap::new();
    for line in text.lines().filter(|l| !l.is_empty()) {
        let malformed = || Error::MalformedOutput {
            line: line.to_string(),
        };
        let (word, count) = line.split_once(' ').ok_or_else(malformed)?;
        let count: u64 = count.parse().map_err(|_| malformed())?;
        *counts.entry(word.to_string()).or_insert(0) += count;
    }
    Ok(counts)
}
