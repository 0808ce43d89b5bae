//! Error taxonomy for the ingestion engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by catalog lookups, fetches, sink I/O and the scheduler
#[derive(Debug, Error)]
pub enum IngestError {
    /// Catalog lookup miss; a configuration error caught at startup
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// Two catalog entries share a name
    #[error("duplicate entity '{0}' in catalog")]
    DuplicateEntity(String),

    /// Unknown domain name (CLI / HTTP lookups)
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),

    /// Transient upstream failure for one entity
    #[error("fetch failed for '{entity}': {source}")]
    FetchFailure {
        entity: String,
        #[source]
        source: FetchError,
    },

    /// Storage-layer failure while publishing a window
    #[error("failed to write sink {path}: {source}")]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Storage-layer failure while reading a sink
    #[error("failed to read sink {path}: {source}")]
    SinkRead {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Filesystem watcher could not be set up
    #[error("sink watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Unexpected failure inside a round
    #[error("schedule fault in round {round}: {message}")]
    ScheduleFault { round: u64, message: String },
}

/// Why a single upstream fetch did not produce a value
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("fetcher cannot handle lookup params {0}")]
    Unsupported(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("fetch task panicked: {0}")]
    Panicked(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
