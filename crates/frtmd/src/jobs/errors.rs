//! Errors surfaced by run orchestration.

use std::io;

use frtm_runs::{Platform, RunId, RunStatus};
use thiserror::Error;

use crate::collaborators::RenderError;
use crate::store::StoreError;

/// Failures of request-scoped orchestration. Background analysis failures
/// are recorded on the run instead.
#[derive(Debug, Error)]
pub enum JobError {
    /// The upload did not name a file.
    #[error("the filename query parameter is required")]
    MissingFileName,
    /// The file extension maps to no platform.
    #[error("unsupported package type '{file_name}': expected .ipa, .app, .apk, .aab or .abb")]
    UnsupportedExtension { file_name: String },
    /// The upload was not sent as raw bytes.
    #[error("unsupported content type '{content_type}': expected application/octet-stream")]
    UnsupportedContentType { content_type: String },
    /// The upload carried no bytes.
    #[error("upload body is empty")]
    EmptyUpload,
    /// The uploaded bytes could not be moved into the store.
    #[error("failed to store upload: {source}")]
    StoreUpload {
        #[source]
        source: io::Error,
    },
    /// No run with the identifier exists.
    #[error("run {id} not found")]
    RunNotFound { id: RunId },
    /// A comparison referenced a run that has not completed.
    #[error("run {id} is {status}, not complete")]
    RunIncomplete { id: RunId, status: RunStatus },
    /// A comparison mixed platforms.
    #[error("cannot compare a {before} run with a {after} run")]
    PlatformMismatch { before: Platform, after: Platform },
    /// Persistence failed.
    #[error(transparent)]
    Store(StoreError),
    /// The renderer failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<StoreError> for JobError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id } => Self::RunNotFound { id },
            other => Self::Store(other),
        }
    }
}
