use clap::Parser;

use super::LayoutArgs;

#[derive(Parser, Debug)]
#[command(version, about = "Runs map and reduce tasks for a coordinator", long_about = None)]
pub struct Args {
    /// Connect to a coordinator at the given IP address and port
    #[clap(short, long, default_value = "127.0.0.1:50051")]
    pub join: String,
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// Seconds to keep trying to reach the coordinator
    #[clap(short = 't', long, default_value_t = 10)]
    pub connect_timeout: u64,
}
