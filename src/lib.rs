//! A distributed word-frequency counter built on MapReduce.
//!
//! A coordinator splits a corpus of text files into near-equal work units
//! ([`planner`]), hands them to workers over a pull-based gRPC protocol
//! ([`coordinator`]) and holds every reduce task back until all map tasks
//! have reported completion. Workers ([`worker`]) tokenize their chunks,
//! route each word to a reduce bucket by its first letter, and exchange
//! intermediate data through a file-addressed shuffle store ([`store`]).

pub mod cmd;
pub mod config;
pub mod coordinator;
pub mod corpus;
pub mod error;
pub mod planner;
pub mod standalone;
pub mod store;
pub mod task;
pub mod telemetry;
pub mod wordcount;
pub mod worker;

pub use error::{Error, Result};

/// Generated gRPC types for the coordinator protocol.
pub mod rpc {
    tonic::include_proto!("mapreduce");
}

/////////////////////////////////////////////////////////////////////////////
// Defaults
/////////////////////////////////////////////////////////////////////////////

/// Port the coordinator listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 50051;

/// Number of RPC handlers the coordinator serves concurrently.
///
/// At most `DEFAULT_MAX_WORKERS - 1` of them may be parked at the
/// map-completion barrier at any time.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Glob matching the input corpus.
pub const DEFAULT_INPUTS: &str = "inputs/*.txt";

/// Directory holding intermediate and output files.
pub const DEFAULT_WORK_DIR: &str = "files";
