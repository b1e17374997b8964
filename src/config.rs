//! Where the corpus lives and where shuffle and output files go.

use std::path::PathBuf;

use crate::{DEFAULT_INPUTS, DEFAULT_WORK_DIR};

/// File-system layout shared by the coordinator and every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Glob matching the input files. Matches are sorted before use.
    pub inputs: String,
    /// Root of `intermediate/` and `out/`.
    pub work_dir: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(DEFAULT_INPUTS, DEFAULT_WORK_DIR)
    }
}

impl Layout {
    pub fn new(inputs: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            inputs: inputs.into(),
            work_dir: work_dir.into(),
        }
    }

    pub fn intermediate_dir(&self) -> PathBuf {
        self.work_dir.join("intermediate")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.work_dir.join("out")
    }

    /// `<work>/intermediate/mr-<map_task>-<bucket>.txt`
    pub fn intermediate_path(&self, map_task: u32, bucket: u32) -> PathBuf {
        self.intermediate_dir()
            .join(format!("mr-{map_task}-{bucket}.txt"))
    }

    /// `<work>/out/out-<bucket>.txt`
    pub fn output_path(&self, bucket: u32) -> PathBuf {
        self.output_dir().join(format!("out-{bucket}.txt"))
    }
}
