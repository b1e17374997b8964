use std::fs;
use std::path::Path;

use bytes::Bytes;
use tracing::trace;

use super::{ShuffleKey, ShuffleStore};
use crate::config::Layout;
use crate::{Error, Result};

/// Shuffle and output files on a (possibly shared) local file system.
///
/// Files left behind by an earlier run in the same work directory are
/// overwritten, never deleted.
#[derive(Debug, Clone)]
pub struct LocalStore {
    layout: Layout,
}

impl LocalStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn write(dir: &Path, path: &Path, data: &[u8]) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| Error::io("create", dir, e))?;
        fs::write(path, data).map_err(|e| Error::io("write", path, e))?;
        trace!(path = %path.display(), bytes = data.len(), "wrote");
        Ok(())
    }

    fn read(path: &Path) -> Result<Bytes> {
        fs::read(path)
            .map(Bytes::from)
            .map_err(|e| Error::io("read", path, e))
    }
}

impl ShuffleStore for LocalStore {
    fn put_intermediate(&self, key: ShuffleKey, data: Bytes) -> Result<()> {
        let path = self.layout.intermediate_path(key.map_task, key.bucket);
        Self::write(&self.layout.intermediate_dir(), &path, &data)
    }

    fn get_intermediate(&self, key: ShuffleKey) -> Result<Bytes> {
        Self::read(&self.layout.intermediate_path(key.map_task, key.bucket))
    }

    fn put_output(&self, bucket: u32, data: Bytes) -> Result<()> {
        let path = self.layout.output_path(bucket);
        Self::write(&self.layout.output_dir(), &path, &data)
    }

    fn get_output(&self, bucket: u32) -> Result<Bytes> {
        Self::read(&self.layout.output_path(bucket))
    }
}
