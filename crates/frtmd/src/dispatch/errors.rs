//! Error types for request dispatch failures.
//!
//! Every request-scoped failure becomes a [`DispatchError`] at the router
//! boundary, and every [`DispatchError`] maps to one HTTP status and a
//! snake_case error code for the JSON error envelope.

use thiserror::Error;

use crate::jobs::JobError;
use crate::store::StoreError;
use crate::transport::{Response, StatusCode, TransportError};

/// Errors surfaced while routing and handling a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No route matches the path.
    #[error("no route for {path}")]
    NotFound { path: String },
    /// The path exists but not for this method.
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed { method: String, path: String },
    /// A path or query value is not a UUID.
    #[error("invalid run id '{value}'")]
    InvalidRunId { value: String },
    /// A required query parameter is absent.
    #[error("missing query parameter '{name}'")]
    MissingQuery { name: &'static str },
    /// The request could not be read.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Orchestration failed.
    #[error(transparent)]
    Job(#[from] JobError),
    /// The handler panicked.
    #[error("handler panicked: {message}")]
    Panicked { message: String },
}

impl DispatchError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NotFound,
            Self::MethodNotAllowed { .. } => StatusCode::MethodNotAllowed,
            Self::InvalidRunId { .. } | Self::MissingQuery { .. } => StatusCode::BadRequest,
            Self::Transport(error) => error
                .response_status()
                .unwrap_or(StatusCode::InternalServerError),
            Self::Job(error) => job_status(error),
            Self::Panicked { .. } => StatusCode::InternalServerError,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::InvalidRunId { .. } => "invalid_run_id",
            Self::MissingQuery { .. } => "missing_query_parameter",
            Self::Transport(error) => error.code(),
            Self::Job(error) => job_code(error),
            Self::Panicked { .. } => "internal_error",
        }
    }

    /// JSON error envelope for the client.
    pub fn to_response(&self) -> Response {
        Response::error(self.status(), self.code(), &self.to_string())
    }
}

fn job_status(error: &JobError) -> StatusCode {
    match error {
        JobError::MissingFileName | JobError::EmptyUpload => StatusCode::BadRequest,
        JobError::UnsupportedExtension { .. } | JobError::UnsupportedContentType { .. } => {
            StatusCode::UnsupportedMediaType
        }
        JobError::RunNotFound { .. } => StatusCode::NotFound,
        JobError::RunIncomplete { .. } | JobError::PlatformMismatch { .. } => {
            StatusCode::Conflict
        }
        JobError::StoreUpload { .. } | JobError::Store(_) | JobError::Render(_) => {
            StatusCode::InternalServerError
        }
    }
}

fn job_code(error: &JobError) -> &'static str {
    match error {
        JobError::MissingFileName => "missing_filename",
        JobError::UnsupportedExtension { .. } => "unsupported_package_type",
        JobError::UnsupportedContentType { .. } => "unsupported_content_type",
        JobError::EmptyUpload => "empty_upload",
        JobError::StoreUpload { .. } => "upload_storage_failed",
        JobError::RunNotFound { .. } => "run_not_found",
        JobError::RunIncomplete { .. } => "run_incomplete",
        JobError::PlatformMismatch { .. } => "platform_mismatch",
        JobError::Store(StoreError::Transition(_)) => "invalid_transition",
        JobError::Store(_) => "storage_error",
        JobError::Render(_) => "render_failed",
    }
}

#[cfg(test)]
mod tests {
    use frtm_runs::{Platform, RunId};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DispatchError::NotFound { path: "/x".into() }, 404, "not_found")]
    #[case(
        DispatchError::MethodNotAllowed { method: "POST".into(), path: "/".into() },
        405,
        "method_not_allowed"
    )]
    #[case(DispatchError::InvalidRunId { value: "abc".into() }, 400, "invalid_run_id")]
    #[case(DispatchError::MissingQuery { name: "before" }, 400, "missing_query_parameter")]
    #[case(DispatchError::Job(JobError::MissingFileName), 400, "missing_filename")]
    #[case(DispatchError::Job(JobError::EmptyUpload), 400, "empty_upload")]
    #[case(
        DispatchError::Job(JobError::UnsupportedExtension { file_name: "a.exe".into() }),
        415,
        "unsupported_package_type"
    )]
    #[case(
        DispatchError::Job(JobError::RunNotFound { id: RunId::nil() }),
        404,
        "run_not_found"
    )]
    #[case(
        DispatchError::Job(JobError::PlatformMismatch {
            before: Platform::Ipa,
            after: Platform::Apk,
        }),
        409,
        "platform_mismatch"
    )]
    #[case(
        DispatchError::Transport(TransportError::UnsupportedTransferEncoding {
            value: "chunked".into(),
        }),
        400,
        "unsupported_transfer_encoding"
    )]
    #[case(DispatchError::Panicked { message: "boom".into() }, 500, "internal_error")]
    fn maps_errors_to_status_and_code(
        #[case] error: DispatchError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(error.status().code(), status);
        assert_eq!(error.code(), code);
    }

    #[test]
    fn response_carries_the_envelope() {
        let error = DispatchError::InvalidRunId {
            value: "nope".into(),
        };
        let response = error.to_response();
        let body: serde_json::Value = serde_json::from_slice(response.body()).expect("json");
        assert_eq!(body["error"]["code"], "invalid_run_id");
        assert_eq!(body["error"]["message"], "invalid run id 'nope'");
    }
}
