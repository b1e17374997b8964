//! Addressable storage for the shuffle between map and reduce.
//!
//! Mapper `m` hands its words for bucket `b` to reducer `b` through a
//! single object keyed `mr-<m>-<b>`. No broker is involved: a reducer
//! finds the contributions of all mappers by enumerating the keys. Write
//! targets are disjoint by construction, so no locking is needed across
//! workers.

use std::fmt;

use bytes::Bytes;

use crate::Result;

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// Address of one mapper's contribution to one reduce bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShuffleKey {
    pub map_task: u32,
    pub bucket: u32,
}

impl ShuffleKey {
    pub fn new(map_task: u32, bucket: u32) -> Self {
        Self { map_task, bucket }
    }
}

impl fmt::Display for ShuffleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mr-{}-{}", self.map_task, self.bucket)
    }
}

/// Backend holding intermediate and final results.
///
/// Intermediate data is one word per line, final output one
/// `<word> <count>` per line.
pub trait ShuffleStore: Send + Sync {
    fn put_intermediate(&self, key: ShuffleKey, data: Bytes) -> Result<()>;

    fn get_intermediate(&self, key: ShuffleKey) -> Result<Bytes>;

    fn put_output(&self, bucket: u32, data: Bytes) -> Result<()>;

    fn get_output(&self, bucket: u32) -> Result<Bytes>;
}
