use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{ShuffleKey, ShuffleStore};
use crate::{Error, Result};

/// In-process store that refuses to overwrite anything.
#[derive(Debug, Default)]
pub struct MemoryStore {
    intermediate: DashMap<ShuffleKey, Bytes>,
    outputs: DashMap<u32, Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intermediate_count(&self) -> usize {
        self.intermediate.len()
    }
}

impl ShuffleStore for MemoryStore {
    fn put_intermediate(&self, key: ShuffleKey, data: Bytes) -> Result<()> {
        match self.intermediate.entry(key) {
            Entry::Occupied(_) => Err(Error::AlreadyWritten(key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(data);
                Ok(())
            }
        }
    }

    fn get_intermediate(&self, key: ShuffleKey) -> Result<Bytes> {
        self.intermediate
            .get(&key)
            .map(|data| data.clone())
            .ok_or_else(|| Error::Missing(key.to_string()))
    }

    fn put_output(&self, bucket: u32, data: Bytes) -> Result<()> {
        match self.outputs.entry(bucket) {
            Entry::Occupied(_) => Err(Error::AlreadyWritten(format!("out-{bucket}"))),
            Entry::Vacant(slot) => {
                slot.insert(data);
                Ok(())
            }
        }
    }

    fn get_output(&self, bucket: u32) -> Result<Bytes> {
        self.outputs
            .get(&bucket)
            .map(|data| data.clone())
            .ok_or_else(|| Error::Missing(format!("out-{bucket}")))
    }
}
