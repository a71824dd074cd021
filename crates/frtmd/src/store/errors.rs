//! Error types for run store operations.

use std::io;
use std::path::PathBuf;

use frtm_runs::{RunId, TransitionError};
use thiserror::Error;

/// Errors surfaced by the run store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A store directory could not be created.
    #[error("failed to create store directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Reading the run index failed.
    #[error("failed to read run index '{path}': {source}")]
    ReadIndex {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The run index is not valid JSON.
    #[error("failed to parse run index '{path}': {source}")]
    ParseIndex {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Writing a file atomically failed.
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Serialising a document failed.
    #[error("failed to serialise '{path}': {source}")]
    Serialise {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Reading a stored blob failed.
    #[error("failed to read '{path}': {source}")]
    ReadBlob {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A stored blob is not valid JSON.
    #[error("failed to parse '{path}': {source}")]
    ParseBlob {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// No run with the identifier exists.
    #[error("run {id} not found")]
    NotFound { id: RunId },
    /// A run with the identifier already exists.
    #[error("run {id} already exists")]
    DuplicateRun { id: RunId },
    /// The run's upload is not on disk.
    #[error("upload for run {id} is missing at '{path}'")]
    MissingUpload { id: RunId, path: PathBuf },
    /// The run has no stored analysis.
    #[error("run {id} has no stored analysis")]
    MissingAnalysis { id: RunId },
    /// The requested status change is not allowed.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// Another thread panicked while holding the index lock.
    #[error("run index lock poisoned")]
    Poisoned,
}
