use std::path::PathBuf;

use clap::Parser;

use crate::cmd::{positive_u32, positive_usize, LayoutArgs};
use crate::DEFAULT_MAX_WORKERS;

pub mod engine;

/// Runs a whole word count in one process, with in-process workers
/// instead of gRPC.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Number of map tasks (N)
    #[clap(value_parser = positive_u32())]
    pub n_map: u32,
    /// Number of reduce tasks (M)
    #[clap(value_parser = positive_u32())]
    pub n_reduce: u32,
    /// Number of worker tasks to run
    #[clap(short = 'k', long, default_value_t = 4, value_parser = positive_usize())]
    pub workers: usize,
    /// Requests the scheduler serves at once
    #[clap(short, long, default_value_t = DEFAULT_MAX_WORKERS, value_parser = positive_usize())]
    pub max_workers: usize,
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// [OPT] Write the per-task byte loads as JSON to this file
    #[clap(long)]
    pub plan_out: Option<PathBuf>,
}
