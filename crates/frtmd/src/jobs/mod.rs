//! Run orchestration: uploads, background analysis, and page assembly.
//!
//! [`JobOrchestrator`] is the only component that talks to the analyzer and
//! the renderer. Request handlers call into it synchronously; each accepted
//! upload gets a detached analysis thread that reports back exclusively
//! through the [`RunStore`].

mod errors;
mod task;
mod upload;


use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use frtm_runs::{Run, RunId};
use tracing::{error, info};
use uuid::Uuid;

pub use self::errors::JobError;
pub use self::upload::{PendingUpload, UPLOAD_CONTENT_TYPE};

use self::task::AnalysisTask;
use crate::collaborators::{Analysis, Collaborators};
use crate::store::{RecoveryReport, RunStore, StoreLayout};
use crate::transport::Body;

/// Tracing target for orchestration events.
pub(crate) const JOBS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::jobs");

/// Coordinates the run store with the analyzer and renderer.
#[derive(Debug, Clone)]
pub struct JobOrchestrator {
    store: Arc<RunStore>,
    collaborators: Collaborators,
}

impl JobOrchestrator {
    pub fn new(store: Arc<RunStore>, collaborators: Collaborators) -> Self {
        Self {
            store,
            collaborators,
        }
    }

    pub fn store(&self) -> &Arc<RunStore> {
        &self.store
    }

    /// Directory uploads are spooled into before they are claimed by a run.
    ///
    /// It shares a filesystem with the final upload location so claiming is
    /// a rename.
    pub fn upload_staging_dir(&self) -> PathBuf {
        self.store.layout().uploads_dir()
    }

    /// Stores the uploaded package, records a queued run, and schedules its
    /// analysis. The run is visible before analysis starts.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::EmptyUpload`] when no bytes arrived, and store
    /// errors when the package or the run cannot be persisted. No run is
    /// recorded on error.
    pub fn submit_upload(&self, upload: PendingUpload, body: Body) -> Result<Run, JobError> {
        if body.is_empty() {
            return Err(JobError::EmptyUpload);
        }

        let id = Uuid::new_v4();
        let relative = StoreLayout::upload_relative_path(id, upload.extension());
        let destination = self.store.layout().resolve(&relative);
        let stored = match body {
            Body::Empty => return Err(JobError::EmptyUpload),
            Body::Bytes(bytes) => fs::write(&destination, bytes),
            Body::File(staged) => staged.persist(&destination),
        };
        stored.map_err(|source| JobError::StoreUpload { source })?;

        let run = Run::queued(id, upload.platform(), upload.file_name(), relative);
        let run = match self.store.create_run(run) {
            Ok(run) => run,
            Err(error) => {
                let _ = fs::remove_file(&destination);
                return Err(error.into());
            }
        };
        info!(
            target: JOBS_TARGET,
            run = %id,
            file_name = %run.original_file_name(),
            platform = %run.platform(),
            "upload accepted"
        );
        self.spawn_analysis(id);
        Ok(run)
    }

    /// Every run, newest first.
    pub fn list_runs(&self) -> Result<Vec<Run>, JobError> {
        Ok(self.store.list_runs()?)
    }

    /// The run with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::RunNotFound`] for unknown ids.
    pub fn run(&self, id: RunId) -> Result<Run, JobError> {
        self.store.run(id)?.ok_or(JobError::RunNotFound { id })
    }

    /// Removes the run and its stored files.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::RunNotFound`] for unknown ids, including runs
    /// already deleted.
    pub fn delete_run(&self, id: RunId) -> Result<Run, JobError> {
        Ok(self.store.delete_run(id)?)
    }

    /// HTML listing every run.
    pub fn index_page(&self) -> Result<String, JobError> {
        let runs = self.store.list_runs()?;
        Ok(self.collaborators.renderer().render_index(&runs)?)
    }

    /// HTML status view for pending or failed runs, the rendered report for
    /// complete ones.
    pub fn run_page(&self, id: RunId) -> Result<String, JobError> {
        let run = self.run(id)?;
        let renderer = self.collaborators.renderer();
        if !run.is_complete() {
            return Ok(renderer.render_status(&run)?);
        }
        let analysis: Analysis = self.store.load_analysis(&run)?;
        Ok(renderer.render_report(&run, &analysis)?)
    }

    /// HTML comparison of two complete runs of one platform.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::RunNotFound`] when either run is missing,
    /// [`JobError::RunIncomplete`] when either is not complete, and
    /// [`JobError::PlatformMismatch`] when the platforms differ.
    pub fn comparison_page(&self, before: RunId, after: RunId) -> Result<String, JobError> {
        let before = self.run(before)?;
        let after = self.run(after)?;
        for run in [&before, &after] {
            if !run.is_complete() {
                return Err(JobError::RunIncomplete {
                    id: run.id(),
                    status: run.status(),
                });
            }
        }
        if before.platform() != after.platform() {
            return Err(JobError::PlatformMismatch {
                before: before.platform(),
                after: after.platform(),
            });
        }
        let before_analysis: Analysis = self.store.load_analysis(&before)?;
        let after_analysis: Analysis = self.store.load_analysis(&after)?;
        Ok(self.collaborators.renderer().render_comparison(
            &before,
            &before_analysis,
            &after,
            &after_analysis,
        )?)
    }

    /// Fails runs interrupted by a previous process and schedules analysis
    /// for runs that never left the queue.
    pub fn recover_interrupted_runs(&self) -> Result<RecoveryReport, JobError> {
        let report = self.store.recover_interrupted()?;
        for id in &report.requeued {
            self.spawn_analysis(*id);
        }
        Ok(report)
    }

    fn spawn_analysis(&self, id: RunId) {
        let task = AnalysisTask::new(
            Arc::clone(&self.store),
            Arc::clone(self.collaborators.analyzer()),
            id,
        );
        let spawned = thread::Builder::new()
            .name(String::from("frtmd-analysis"))
            .spawn(move || task.run());
        if let Err(spawn_error) = spawned {
            error!(
                target: JOBS_TARGET,
                run = %id,
                error = %spawn_error,
                "failed to spawn analysis thread"
            );
            let message = format!("failed to start analysis: {spawn_error}");
            let recorded = self.store.update_run(id, |run| {
                run.mark_running()?;
                run.mark_failed(message)
            });
            if let Err(store_error) = recorded {
                error!(
                    target: JOBS_TARGET,
                    run = %id,
                    error = %store_error,
                    "failed to record analysis spawn failure"
                );
            }
        }
    }
}
