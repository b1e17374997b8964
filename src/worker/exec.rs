//! Map and reduce execution.

use bytes::{BufMut, BytesMut};
use tracing::{debug, instrument};

use crate::corpus::Corpus;
use crate::store::{ShuffleKey, ShuffleStore};
use crate::task::{MapTask, ReduceTask};
use crate::wordcount::{self, WordCounts};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapStats {
    pub bytes_read: u64,
    pub words: u64,
    /// Words routed to each bucket.
    pub per_bucket: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReduceStats {
    pub occurrences: u64,
    pub distinct_words: usize,
}

/// Tokenizes every chunk of `task` and writes one intermediate object per
/// bucket, including empty ones.
#[instrument(skip_all, fields(task = task.id))]
pub fn run_map<C, S>(corpus: &C, store: &S, task: &MapTask) -> Result<MapStats>
where
    C: Corpus + ?Sized,
    S: ShuffleStore + ?Sized,
{
    let n_buckets = task.n_reduce as usize;
    let mut buckets = vec![BytesMut::new(); n_buckets];
    let mut stats = MapStats {
        per_bucket: vec![0; n_buckets],
        ..MapStats::default()
    };

    // Chunks are tokenized one at a time so a word can never be glued
    // across a file boundary.
    for chunk in &task.chunks {
        let text = corpus.read_range(chunk.file_index, chunk.start, chunk.extent)?;
        stats.bytes_read += text.len() as u64;
        for word in wordcount::tokenize(&text) {
            let bucket = wordcount::bucket_for(&word, task.n_reduce) as usize;
            buckets[bucket].put_slice(&word);
            buckets[bucket].put_u8(b'\n');
            stats.per_bucket[bucket] += 1;
            stats.words += 1;
        }
    }

    for (bucket, data) in buckets.into_iter().enumerate() {
        store.put_intermediate(ShuffleKey::new(task.id, bucket as u32), data.freeze())?;
    }
    debug!(bytes = stats.bytes_read, words = stats.words, "map finished");
    Ok(stats)
}

/// Counts the words every map task routed to this bucket and writes the
/// totals.
#[instrument(skip_all, fields(task = task.id))]
pub fn run_reduce<S>(store: &S, task: &ReduceTask) -> Result<ReduceStats>
where
    S: ShuffleStore + ?Sized,
{
    let counts = count_bucket(store, task)?;
    let occurrences = counts.values().sum();
    store.put_output(task.id, wordcount::render_counts(&counts))?;

    debug!(occurrences, distinct = counts.len(), "reduce finished");
    Ok(ReduceStats {
        occurrences,
        distinct_words: counts.len(),
    })
}

/// Reads `mr-<m>-<bucket>` for every map task `m` and tallies the words.
///
/// Only reads; calling it twice yields the same counts.
pub fn count_bucket<S>(store: &S, task: &ReduceTask) -> Result<WordCounts>
where
    S: ShuffleStore + ?Sized,
{
    let mut counts = WordCounts::default();
    for map_task in 0..task.n_map {
        let data = store.get_intermediate(ShuffleKey::new(map_task, task.id))?;
        wordcount::count_lines(&data, &mut counts);
    }
    Ok(counts)
}
