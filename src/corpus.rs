//! Read access to the input files.
//!
//! Files are addressed by their index in a stably sorted list, so the
//! coordinator and every worker agree on what `file_index` means as long
//! as they were given the same input glob.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use glob::glob;
use serde::Serialize;

use crate::{Error, Result};

/// How far a byte range reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Extent {
    /// Exactly this many bytes (fewer if the file is shorter).
    Bytes(u64),
    /// Everything up to the end of the file.
    ToEnd,
}

/// An ordered set of immutable input files.
pub trait Corpus {
    fn file_count(&self) -> usize;

    fn file_size(&self, file: usize) -> Result<u64>;

    /// Reads `extent` bytes of `file` starting at `offset`.
    ///
    /// Ranges running past the end of the file are clamped.
    fn read_range(&self, file: usize, offset: u64, extent: Extent) -> Result<Bytes>;
}

/// Input files on the local file system.
#[derive(Debug, Clone, Default)]
pub struct DiskCorpus {
    files: Vec<PathBuf>,
}

impl DiskCorpus {
    /// Collects every file matching `pattern`, sorted lexicographically.
    pub fn from_glob(pattern: &str) -> Result<Self> {
        let entries = glob(pattern)
            .map_err(|e| Error::Config(format!("bad input pattern {pattern:?}: {e}")))?;
        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().to_path_buf();
                    return Err(Error::io("list", &path, e.into_error()));
                }
            }
        }
        files.sort();
        Ok(Self { files })
    }

    /// Uses `files` in the given order.
    pub fn from_paths(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }

    fn path(&self, file: usize) -> Result<&Path> {
        self.files
            .get(file)
            .map(PathBuf::as_path)
            .ok_or(Error::UnknownFile {
                index: file,
                count: self.files.len(),
            })
    }
}

impl Corpus for DiskCorpus {
    fn file_count(&self) -> usize {
        self.files.len()
    }

    fn file_size(&self, file: usize) -> Result<u64> {
        let path = self.path(file)?;
        let meta = fs::metadata(path).map_err(|e| Error::io("stat", path, e))?;
        Ok(meta.len())
    }

    fn read_range(&self, file: usize, offset: u64, extent: Extent) -> Result<Bytes> {
        let path = self.path(file)?;
        let mut f = File::open(path).map_err(|e| Error::io("open", path, e))?;
        f.seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io("seek in", path, e))?;

        let mut buf = Vec::new();
        let read = match extent {
            Extent::ToEnd => f.read_to_end(&mut buf),
            Extent::Bytes(n) => f.take(n).read_to_end(&mut buf),
        };
        read.map_err(|e| Error::io("read", path, e))?;
        Ok(Bytes::from(buf))
    }
}

/// Input files held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    files: Vec<Bytes>,
}

impl MemoryCorpus {
    pub fn new<I, B>(files: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    /// All files glued together in order.
    pub fn concat(&self) -> Vec<u8> {
        self.files.iter().flat_map(|f| f.iter().copied()).collect()
    }

    fn file(&self, file: usize) -> Result<&Bytes> {
        self.files.get(file).ok_or(Error::UnknownFile {
            index: file,
            count: self.files.len(),
        })
    }
}

impl Corpus for MemoryCorpus {
    fn file_count(&self) -> usize {
        self.files.len()
    }

    fn file_size(&self, file: usize) -> Result<u64> {
        Ok(self.file(file)?.len() as u64)
    }

    fn read_range(&self, file: usize, offset: u64, extent: Extent) -> Result<Bytes> {
        let data = self.file(file)?;
        let len = data.len();
        let start = usize::try_from(offset).map_or(len, |o| o.min(len));
        let end = match extent {
            Extent::ToEnd => len,
            Extent::Bytes(n) => {
                usize::try_from(n).map_or(len, |n| start.saturating_add(n).min(len))
            }
        };
        Ok(data.slice(start..end))
    }
}
