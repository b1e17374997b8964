//! Error types shared by the planner, scheduler, worker and stores.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation on a corpus, intermediate or output file failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Invalid task counts or limits
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Chunk refers to a file index outside the corpus
    #[error("input file {index} is not part of the corpus ({count} files)")]
    UnknownFile { index: usize, count: usize },

    /// Wire task that does not decode into an assignment
    #[error("malformed task from coordinator: {0}")]
    InvalidTask(String),

    /// Write-once object written a second time
    #[error("{0} was already written")]
    AlreadyWritten(String),

    #[error("{0} does not exist")]
    Missing(String),

    #[error("malformed output line {line:?}")]
    MalformedOutput { line: String },

    /// RPC to the coordinator failed
    #[error("coordinator call failed: {0}")]
    Transport(#[from] tonic::Status),

    /// gRPC channel or server failure
    #[error("gRPC transport failure: {0}")]
    Grpc(#[from] tonic::transport::Error),

    /// A blocking map or reduce execution panicked or was cancelled
    #[error("task execution aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(action: &str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            context: format!("failed to {action} {}", path.display()),
            source,
        }
    }

    /// Whether the coordinator link is gone, as opposed to a local failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Grpc(_))
    }
}
