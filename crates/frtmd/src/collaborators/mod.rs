//! Seams to the package analyzers and the report renderer.
//!
//! The daemon never inspects package contents or builds dashboards itself.
//! It hands a stored package to an [`Analyzer`] and the resulting
//! [`Analysis`] to a [`Renderer`]. The placeholder implementations here let
//! the daemon run end to end without the platform-specific analyzers.

mod analysis;
mod digest;
mod errors;
mod html;

use std::path::Path;
use std::sync::Arc;

use frtm_runs::{Platform, Run};

pub use self::analysis::Analysis;
pub use self::digest::DigestAnalyzer;
pub use self::errors::{AnalyzerError, RenderError};
pub use self::html::PlainHtmlRenderer;

/// Converts a stored package into an [`Analysis`].
pub trait Analyzer: Send + Sync {
    /// Analyses the package at `package`.
    ///
    /// `Ok(None)` means the analyzer produced nothing for the package; the
    /// run is then marked failed.
    fn analyze(&self, platform: Platform, package: &Path)
    -> Result<Option<Analysis>, AnalyzerError>;
}

/// Produces the HTML documents served by the daemon.
pub trait Renderer: Send + Sync {
    /// Page listing every run.
    fn render_index(&self, runs: &[Run]) -> Result<String, RenderError>;

    /// Page shown while a run is queued or running, or after it failed.
    fn render_status(&self, run: &Run) -> Result<String, RenderError>;

    /// Report for a complete run.
    fn render_report(&self, run: &Run, analysis: &Analysis) -> Result<String, RenderError>;

    /// Side-by-side comparison of two complete runs of the same platform.
    fn render_comparison(
        &self,
        before: &Run,
        before_analysis: &Analysis,
        after: &Run,
        after_analysis: &Analysis,
    ) -> Result<String, RenderError>;
}

/// Analyzer and renderer shared by the request handlers and the analysis
/// tasks.
#[derive(Clone)]
pub struct Collaborators {
    analyzer: Arc<dyn Analyzer>,
    renderer: Arc<dyn Renderer>,
}

impl Collaborators {
    pub fn new(analyzer: Arc<dyn Analyzer>, renderer: Arc<dyn Renderer>) -> Self {
        Self { analyzer, renderer }
    }

    /// Digest analyzer and plain HTML renderer.
    pub fn placeholder() -> Self {
        Self::new(Arc::new(DigestAnalyzer), Arc::new(PlainHtmlRenderer))
    }

    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
