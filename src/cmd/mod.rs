//! Command-line arguments of the binaries.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::Args;

use crate::config::Layout;
use crate::task::MAX_WIRE_INDEX;
use crate::{DEFAULT_INPUTS, DEFAULT_WORK_DIR};

pub mod coordinator;
pub mod worker;

/// Where the inputs are read from and the shuffle files go.
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Glob matching the input text files
    #[clap(short, long, default_value = DEFAULT_INPUTS)]
    pub inputs: String,
    /// Directory for intermediate and output files
    #[clap(short, long, default_value = DEFAULT_WORK_DIR)]
    pub work_dir: PathBuf,
}

impl LayoutArgs {
    pub fn layout(&self) -> Layout {
        Layout::new(self.inputs.clone(), self.work_dir.clone())
    }
}

/// Parses a task count: at least one, and small enough for the wire.
pub fn positive_u32() -> RangedU64ValueParser<u32> {
    RangedU64ValueParser::new().range(1..=u64::from(MAX_WIRE_INDEX))
}

pub fn positive_usize() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}
