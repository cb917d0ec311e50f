//! Error types for mapreduce stages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MRError>;

#[derive(Error, Debug)]
pub enum MRError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("partition count must be at least 1, got {0}")]
    InvalidPartitionCount(usize),

    /// The partitioner could not produce a full boundary list; usually the input container
    /// is missing or unreadable.
    #[error("splitting input failed: expected {expected} boundaries, got {got}")]
    SplitFailed { expected: usize, got: usize },

    #[error("partition {partition} failed: {source}")]
    Worker {
        partition: usize,
        #[source]
        source: Box<MRError>,
    },

    #[error("input container {0:?} does not exist")]
    MissingInput(PathBuf),

    #[error("could not prepare working directory {path:?}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MRError {
    /// Wraps an io::Error with the path of the file it occurred on.
    pub fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> MRError {
        MRError::Io {
            path: path.into(),
            source: source,
        }
    }
}
