//! Background analysis of one uploaded package.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use frtm_runs::{Run, RunId};
use tracing::{debug, info, warn};

use super::JOBS_TARGET;
use crate::collaborators::Analyzer;
use crate::panic_message::panic_message;
use crate::store::{RunStore, StoreError};

/// Everything an analysis thread needs: a store handle, the analyzer, and
/// the run id.
pub(super) struct AnalysisTask {
    store: Arc<RunStore>,
    analyzer: Arc<dyn Analyzer>,
    id: RunId,
}

impl AnalysisTask {
    pub(super) fn new(store: Arc<RunStore>, analyzer: Arc<dyn Analyzer>, id: RunId) -> Self {
        Self {
            store,
            analyzer,
            id,
        }
    }

    /// Drives the run from `queued` to `complete` or `failed`.
    pub(super) fn run(self) {
        let run = match self.store.update_run(self.id, Run::mark_running) {
            Ok(run) => run,
            Err(error) => {
                warn!(
                    target: JOBS_TARGET,
                    run = %self.id,
                    error = %error,
                    "cannot start analysis"
                );
                return;
            }
        };
        debug!(
            target: JOBS_TARGET,
            run = %self.id,
            platform = %run.platform(),
            "analysis started"
        );

        match self.analyse(&run) {
            Ok(analysis_path) => self.complete(analysis_path),
            Err(message) => {
                warn!(
                    target: JOBS_TARGET,
                    run = %self.id,
                    error = %message,
                    "analysis failed"
                );
                self.fail(message);
            }
        }
    }

    /// Runs the analyzer and stores its output, returning the stored path or
    /// the message to record on the run.
    fn analyse(&self, run: &Run) -> Result<String, String> {
        let package = self.store.upload_path(run);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.analyzer.analyze(run.platform(), &package)
        }));
        let analysis = match outcome {
            Ok(Ok(Some(analysis))) => analysis,
            Ok(Ok(None)) => return Err(String::from("analyzer produced no analysis")),
            Ok(Err(error)) => return Err(error.to_string()),
            Err(payload) => {
                return Err(format!("analyzer panicked: {}", panic_message(payload.as_ref())));
            }
        };
        self.store
            .write_analysis(self.id, &analysis)
            .map_err(|error| error.to_string())
    }

    /// Records the stored analysis on the run. The analysis document is
    /// removed again when no run ends up referencing it.
    fn complete(&self, analysis_path: String) {
        match self
            .store
            .update_run(self.id, |run| run.mark_complete(analysis_path))
        {
            Ok(run) => info!(
                target: JOBS_TARGET,
                run = %self.id,
                status = %run.status(),
                "analysis finished"
            ),
            Err(StoreError::NotFound { .. }) => {
                self.store.discard_analysis(self.id);
                info!(
                    target: JOBS_TARGET,
                    run = %self.id,
                    "run deleted during analysis"
                );
            }
            Err(error) => {
                warn!(
                    target: JOBS_TARGET,
                    run = %self.id,
                    error = %error,
                    "failed to record completed analysis"
                );
                self.store.discard_analysis(self.id);
                self.fail(format!("failed to record analysis: {error}"));
            }
        }
    }

    fn fail(&self, message: String) {
        match self.store.update_run(self.id, |run| run.mark_failed(message)) {
            Ok(run) => info!(
                target: JOBS_TARGET,
                run = %self.id,
                status = %run.status(),
                "analysis finished"
            ),
            Err(StoreError::NotFound { .. }) => debug!(
                target: JOBS_TARGET,
                run = %self.id,
                "run deleted during analysis"
            ),
            Err(error) => warn!(
                target: JOBS_TARGET,
                run = %self.id,
                error = %error,
                "failed to record analysis outcome"
            ),
        }
    }
}
