use std::path::PathBuf;

use clap::Parser;

use super::{positive_u32, positive_usize, LayoutArgs};
use crate::{DEFAULT_MAX_WORKERS, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(version, about = "Plans a word count and hands its tasks to workers", long_about = None)]
pub struct Args {
    /// Number of map tasks (N)
    #[clap(value_parser = positive_u32())]
    pub n_map: u32,
    /// Number of reduce tasks, one per output bucket (M)
    #[clap(value_parser = positive_u32())]
    pub n_reduce: u32,
    /// Port for the coordinator to listen on
    #[clap(short = 'P', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Requests served at once; one fewer may wait for the map phase to end
    #[clap(short, long, default_value_t = DEFAULT_MAX_WORKERS, value_parser = positive_usize())]
    pub max_workers: usize,
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// [OPT] Write the per-task byte loads as JSON to this file
    #[clap(long)]
    pub plan_out: Option<PathBuf>,
}
