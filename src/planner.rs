//! Splits the corpus into `N` near-equal map tasks without copying data.
//!
//! Input file sizes can vary a lot, so handing whole files to workers
//! gives a lopsided load. Instead the corpus is treated as one long byte
//! stream and cut into `N` pieces of about `total / N` bytes. A piece is
//! a list of [`Chunk`]s, each naming a byte range of one file; only those
//! descriptors travel to the workers.
//!
//! A cut never lands inside a word: when the byte before a tentative cut
//! is alphabetic, the chunk is stretched forward to the end of that word.
//! The next chunk therefore always starts on a word boundary.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::corpus::{Corpus, Extent};
use crate::{Error, Result};

/// Bytes read per step while stretching a chunk to the end of a word.
const PEEK_BLOCK: u64 = 64;

/// A byte range of one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Chunk {
    pub file_index: usize,
    pub start: u64,
    pub extent: Extent,
}

impl Chunk {
    pub fn new(file_index: usize, start: u64, extent: Extent) -> Self {
        Self {
            file_index,
            start,
            extent,
        }
    }
}

/// The chunks making up one map task, in read order.
pub type ChunkPlan = Vec<Chunk>;

/// Cuts `corpus` into exactly `n_map` chunk plans.
///
/// Every byte of every file lands in exactly one chunk, in file order.
/// The last plan absorbs whatever the integer division leaves over, and
/// a plan may be empty when the corpus has fewer bytes than tasks.
pub fn plan<C: Corpus + ?Sized>(corpus: &C, n_map: usize) -> Result<Vec<ChunkPlan>> {
    if n_map == 0 {
        return Err(Error::Config("at least one map task is required".into()));
    }

    let sizes = (0..corpus.file_count())
        .map(|i| corpus.file_size(i))
        .collect::<Result<Vec<u64>>>()?;
    let total: u64 = sizes.iter().sum();
    let target = total / n_map as u64;
    debug!(files = sizes.len(), total, target, n_map, "planning chunks");

    let mut plans = Vec::with_capacity(n_map);
    let mut file = 0;
    let mut offset = 0;

    for task in 0..n_map {
        let mut chunks = ChunkPlan::new();
        let mut budget = if task + 1 == n_map { u64::MAX } else { target };

        while budget > 0 && file < sizes.len() {
            let left_in_file = sizes[file] - offset;
            if left_in_file == 0 {
                file += 1;
                offset = 0;
                continue;
            }

            if budget >= left_in_file {
                chunks.push(Chunk {
                    file_index: file,
                    start: offset,
                    extent: Extent::ToEnd,
                });
                budget -= left_in_file;
                file += 1;
                offset = 0;
                continue;
            }

            // The chunk ends inside this file; finish its trailing word.
            let end = offset + budget;
            match word_end(corpus, file, end, sizes[file])? {
                Some(end) => {
                    chunks.push(Chunk {
                        file_index: file,
                        start: offset,
                        extent: Extent::Bytes(end - offset),
                    });
                    offset = end;
                }
                None => {
                    chunks.push(Chunk {
                        file_index: file,
                        start: offset,
                        extent: Extent::ToEnd,
                    });
                    file += 1;
                    offset = 0;
                }
            }
            budget = 0;
        }
        plans.push(chunks);
    }
    Ok(plans)
}

/// Moves a tentative cut at `end` past the word it would split.
///
/// Returns `None` when the word runs to the end of the file.
fn word_end<C: Corpus + ?Sized>(
    corpus: &C,
    file: usize,
    end: u64,
    size: u64,
) -> Result<Option<u64>> {
    let last = corpus.read_range(file, end - 1, Extent::Bytes(1))?;
    if !last.first().is_some_and(u8::is_ascii_alphabetic) {
        return Ok(Some(end));
    }

    let mut cut = end;
    while cut < size {
        let block = corpus.read_range(file, cut, Extent::Bytes(PEEK_BLOCK))?;
        if block.is_empty() {
            break;
        }
        match block.iter().position(|b| !b.is_ascii_alphabetic()) {
            Some(i) => return Ok(Some(cut + i as u64)),
            None => cut += block.len() as u64,
        }
    }
    Ok(None)
}

/////////////////////////////////////////////////////////////////////////////
// Plan reports
/////////////////////////////////////////////////////////////////////////////

/// Load distribution of a plan, for offline analysis.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub total_bytes: u64,
    pub tasks: Vec<TaskLoad>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskLoad {
    pub task_id: usize,
    pub bytes: u64,
    pub chunks: ChunkPlan,
}

impl PlanReport {
    pub fn new<C: Corpus + ?Sized>(corpus: &C, plans: &[ChunkPlan]) -> Result<Self> {
        let mut tasks = Vec::with_capacity(plans.len());
        for (task_id, chunks) in plans.iter().enumerate() {
            let mut bytes = 0;
            for chunk in chunks {
                bytes += match chunk.extent {
                    Extent::Bytes(n) => n,
                    Extent::ToEnd => corpus
                        .file_size(chunk.file_index)?
                        .saturating_sub(chunk.start),
                };
            }
            tasks.push(TaskLoad {
                task_id,
                bytes,
                chunks: chunks.clone(),
            });
        }
        Ok(Self {
            total_bytes: tasks.iter().map(|t| t.bytes).sum(),
            tasks,
        })
    }

    /// Writes the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::io("serialize plan for", path, e.into()))?;
        fs::write(path, json).map_err(|e| Error::io("write", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::MemoryCorpus;
    use crate::wordcount::tokenize;

    fn materialize(corpus: &MemoryCorpus, plans: &[ChunkPlan]) -> Vec<Vec<u8>> {
        plans
            .iter()
            .flatten()
            .map(|c| corpus.read_range(c.file_index, c.start, c.extent).unwrap().to_vec())
            .collect()
    }

    fn words_of(buf: &[u8]) -> Vec<Vec<u8>> {
        tokenize(buf).collect()
    }

    /// Deterministic corpora covering short, long, empty and
    /// newline-less files, with words of varied length.
    fn corpora() -> Vec<MemoryCorpus> {
        let vocab = ["a", "to", "cat", "word", "split", "boundary", "extraordinarily"];
        let mut out = vec![
            MemoryCorpus::new(["the cat sat on the mat\n", "a cat and a hat\n"]),
            MemoryCorpus::new(["", "abc", "", "def ghi", ""]),
            MemoryCorpus::new(["onelongwordwithoutanyspaces"]),
            MemoryCorpus::new(["x"]),
            MemoryCorpus::new(Vec::<&str>::new()),
            MemoryCorpus::new(["  ,, !! ..  ", "12 34 56"]),
        ];
        for seed in 1..6usize {
            let files: Vec<String> = (0..seed + 1)
                .map(|f| {
                    (0..(seed * 7 + f * 13) % 40 + 3)
                        .map(|i| {
                            let w = vocab[(i * seed + f) % vocab.len()];
                            let sep = [" ", "\n", ", ", "--", "'"][(i + seed) % 5];
                            format!("{w}{sep}")
                        })
                        .collect()
                })
                .collect();
            out.push(MemoryCorpus::new(files));
        }
        out
    }

    #[test]
    fn rejects_zero_tasks() {
        let corpus = MemoryCorpus::new(["abc"]);
        assert!(matches!(plan(&corpus, 0), Err(Error::Config(_))));
    }

    #[test]
    fn always_produces_n_plans() {
        for corpus in corpora() {
            for n in 1..12 {
                assert_eq!(plan(&corpus, n).unwrap().len(), n);
            }
        }
    }

    #[test]
    fn chunks_cover_every_byte_in_order() {
        for corpus in corpora() {
            for n in 1..25 {
                let plans = plan(&corpus, n).unwrap();
                let joined: Vec<u8> = materialize(&corpus, &plans).concat();
                assert_eq!(joined, corpus.concat(), "coverage broken for n={n}");
            }
        }
    }

    #[test]
    fn chunks_never_split_a_word() {
        for corpus in corpora() {
            let expected: Vec<Vec<u8>> = (0..corpus.file_count())
                .flat_map(|f| words_of(&corpus.read_range(f, 0, Extent::ToEnd).unwrap()))
                .collect();
            for n in 1..25 {
                let plans = plan(&corpus, n).unwrap();
                let got: Vec<Vec<u8>> = materialize(&corpus, &plans)
                    .iter()
                    .flat_map(|c| words_of(c))
                    .collect();
                assert_eq!(got, expected, "word split for n={n}");
            }
        }
    }

    #[test]
    fn plans_are_deterministic() {
        for corpus in corpora() {
            for n in 1..10 {
                assert_eq!(plan(&corpus, n).unwrap(), plan(&corpus, n).unwrap());
            }
        }
    }

    #[test]
    fn golden_corpus_split_in_three() {
        // 23 + 16 bytes, 13 per task.
        let corpus = MemoryCorpus::new(["the cat sat on the mat\n", "a cat and a hat\n"]);
        let plans = plan(&corpus, 3).unwrap();
        assert_eq!(
            plans,
            vec![
                // "the cat sat o" stretches to finish "on".
                vec![Chunk::new(0, 0, Extent::Bytes(14))],
                vec![
                    Chunk::new(0, 14, Extent::ToEnd),
                    // "a c" stretches to finish "cat".
                    Chunk::new(1, 0, Extent::Bytes(5)),
                ],
                vec![Chunk::new(1, 5, Extent::ToEnd)],
            ]
        );
    }

    #[test]
    fn word_running_to_end_of_file_becomes_to_end() {
        let corpus = MemoryCorpus::new(["abcdefghij", "k l"]);
        let plans = plan(&corpus, 3).unwrap();
        assert_eq!(
            plans[0],
            vec![Chunk::new(0, 0, Extent::ToEnd)]
        );
        let joined: Vec<u8> = materialize(&corpus, &plans).concat();
        assert_eq!(joined, corpus.concat());
    }

    #[test]
    fn last_task_absorbs_remainder() {
        // 10 bytes over 3 tasks: 3 + 3 + 4.
        let corpus = MemoryCorpus::new(["a b c d e "]);
        let plans = plan(&corpus, 3).unwrap();
        let report = PlanReport::new(&corpus, &plans).unwrap();
        let loads: Vec<u64> = report.tasks.iter().map(|t| t.bytes).collect();
        assert_eq!(loads, [3, 3, 4]);
        assert_eq!(report.total_bytes, 10);
    }

    #[test]
    fn tiny_corpus_goes_to_the_last_task() {
        let corpus = MemoryCorpus::new(["ab"]);
        let plans = plan(&corpus, 5).unwrap();
        assert!(plans[..4].iter().all(Vec::is_empty));
        assert_eq!(
            plans[4],
            vec![Chunk::new(0, 0, Extent::ToEnd)]
        );
    }

    #[test]
    fn empty_files_produce_no_chunks() {
        let corpus = MemoryCorpus::new(["", "", "hi", ""]);
        let plans = plan(&corpus, 2).unwrap();
        let all: Vec<&Chunk> = plans.iter().flatten().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].file_index, 2);
    }

    #[test]
    fn report_serializes_extents() {
        let corpus = MemoryCorpus::new(["abc def"]);
        let plans = plan(&corpus, 2).unwrap();
        let json = serde_json::to_value(PlanReport::new(&corpus, &plans).unwrap()).unwrap();
        assert_eq!(json["tasks"][0]["chunks"][0]["extent"]["bytes"], 3);
        assert_eq!(json["tasks"][1]["chunks"][0]["extent"], "to_end");
    }

    #[test]
    fn report_is_saved_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let corpus = MemoryCorpus::new(["abc def"]);
        let report = PlanReport::new(&corpus, &plan(&corpus, 2).unwrap()).unwrap();
        report.save(&path).unwrap();

        let raw = std::fs::read(&path).unwrap();
        let saved: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(saved["total_bytes"], 7);
        assert_eq!(saved["tasks"].as_array().map(Vec::len), Some(2));
    }
}
