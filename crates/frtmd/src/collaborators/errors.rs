//! Errors reported by collaborators.

use std::error::Error as StdError;

use thiserror::Error;

type BoxedSource = Box<dyn StdError + Send + Sync>;

/// Failure reported by an [`Analyzer`](super::Analyzer).
///
/// The message is recorded on the failed run.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AnalyzerError {
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl AnalyzerError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by a [`Renderer`](super::Renderer).
#[derive(Debug, Error)]
#[error("failed to render {page}: {message}")]
pub struct RenderError {
    page: &'static str,
    message: String,
}

impl RenderError {
    #[must_use]
    pub fn new(page: &'static str, message: impl Into<String>) -> Self {
        Self {
            page,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn page(&self) -> &'static str {
        self.page
    }
}
