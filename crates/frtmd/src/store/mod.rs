//! Durable run persistence under the content root.
//!
//! The run index lives in `runs.json` and is rewritten atomically on every
//! mutation. Uploaded packages and analysis documents are stored as blobs
//! next to it. A single mutex serialises index mutations so concurrent
//! writers cannot lose each other's updates.

mod errors;
mod files;
mod index;
mod layout;


use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use frtm_runs::{Run, RunId, RunStatus, TransitionError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub use self::errors::StoreError;
pub use self::layout::StoreLayout;

use self::files::atomic_write;
use self::index::{read_index, write_index};

/// Tracing target for store operations.
pub(crate) const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// Error message recorded on runs that were running when the process stopped.
pub const INTERRUPTED_MESSAGE: &str = "interrupted";

/// Outcome of reconciling runs left behind by a previous process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Runs moved from `running` to `failed`.
    pub interrupted: Vec<RunId>,
    /// Runs still `queued` that need their analysis scheduled again.
    pub requeued: Vec<RunId>,
}

/// Thread-safe store of runs and their blobs.
#[derive(Debug)]
pub struct RunStore {
    layout: StoreLayout,
    cache: Mutex<Option<Vec<Run>>>,
}

impl RunStore {
    /// Opens the store rooted at `root`, creating its directories.
    ///
    /// The index is read lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CreateDirectory`] when the layout cannot be
    /// prepared.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let layout = StoreLayout::new(root);
        layout.prepare()?;
        debug!(
            target: STORE_TARGET,
            root = %layout.root().display(),
            "run store opened"
        );
        Ok(Self {
            layout,
            cache: Mutex::new(None),
        })
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Returns every run, newest first.
    pub fn list_runs(&self) -> Result<Vec<Run>, StoreError> {
        let mut guard = self.lock()?;
        Ok(self.loaded(&mut guard)?.clone())
    }

    /// Returns the run with `id`, if any.
    pub fn run(&self, id: RunId) -> Result<Option<Run>, StoreError> {
        let mut guard = self.lock()?;
        Ok(self
            .loaded(&mut guard)?
            .iter()
            .find(|run| run.id() == id)
            .cloned())
    }

    /// Adds a run to the front of the index.
    ///
    /// The run's upload must already be on disk.
    ///
    /// # Errors
    ///
    /// Fails when the id is taken, the upload is missing, or the index
    /// cannot be written.
    pub fn create_run(&self, run: Run) -> Result<Run, StoreError> {
        let upload = self.layout.resolve(run.uploaded_file_relative_path());
        if !upload.is_file() {
            return Err(StoreError::MissingUpload {
                id: run.id(),
                path: upload,
            });
        }
        let created = run.clone();
        self.mutate(|runs| {
            if runs.iter().any(|existing| existing.id() == run.id()) {
                return Err(StoreError::DuplicateRun { id: run.id() });
            }
            runs.insert(0, run);
            Ok(())
        })?;
        info!(
            target: STORE_TARGET,
            run = %created.id(),
            platform = %created.platform(),
            "run created"
        );
        Ok(created)
    }

    /// Applies `change` to the run and persists the result.
    ///
    /// Nothing is written when `change` rejects the transition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids,
    /// [`StoreError::Transition`] for illegal status changes, and write
    /// errors from the index.
    pub fn update_run<F>(&self, id: RunId, change: F) -> Result<Run, StoreError>
    where
        F: FnOnce(&mut Run) -> Result<(), TransitionError>,
    {
        let updated = self.mutate(|runs| {
            let run = runs
                .iter_mut()
                .find(|run| run.id() == id)
                .ok_or(StoreError::NotFound { id })?;
            change(run)?;
            Ok(run.clone())
        })?;
        debug!(
            target: STORE_TARGET,
            run = %id,
            status = %updated.status(),
            "run updated"
        );
        Ok(updated)
    }

    /// Removes the run from the index, then deletes its blobs.
    ///
    /// Blob removal is best-effort; failures are logged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no such run exists.
    pub fn delete_run(&self, id: RunId) -> Result<Run, StoreError> {
        let removed = self.mutate(|runs| {
            let position = runs
                .iter()
                .position(|run| run.id() == id)
                .ok_or(StoreError::NotFound { id })?;
            Ok(runs.remove(position))
        })?;

        let mut blobs = vec![self.layout.resolve(removed.uploaded_file_relative_path())];
        if let Some(analysis) = removed.analysis_relative_path() {
            blobs.push(self.layout.resolve(analysis));
        }
        for blob in blobs {
            remove_blob(id, &blob);
        }
        info!(target: STORE_TARGET, run = %id, "run deleted");
        Ok(removed)
    }

    /// Stores the analysis document for `id` and returns its relative path.
    ///
    /// # Errors
    ///
    /// Returns serialisation or write errors.
    pub fn write_analysis<T: Serialize + ?Sized>(
        &self,
        id: RunId,
        analysis: &T,
    ) -> Result<String, StoreError> {
        let relative = StoreLayout::analysis_relative_path(id);
        let path = self.layout.resolve(&relative);
        let bytes =
            serde_json::to_vec_pretty(analysis).map_err(|source| StoreError::Serialise {
                path: path.clone(),
                source,
            })?;
        atomic_write(&path, &bytes).map_err(|source| StoreError::Write { path, source })?;
        Ok(relative)
    }

    /// Removes the analysis document written for `id` when no run records
    /// it, for example because the run was deleted while it was analysed.
    ///
    /// Removal is best-effort; failures are logged.
    pub fn discard_analysis(&self, id: RunId) {
        let path = self.layout.resolve(&StoreLayout::analysis_relative_path(id));
        remove_blob(id, &path);
    }

    /// Loads the stored analysis for a complete run.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingAnalysis`] when the run has no analysis
    /// path, and read or parse errors for the blob.
    pub fn load_analysis<T: DeserializeOwned>(&self, run: &Run) -> Result<T, StoreError> {
        let relative = run
            .analysis_relative_path()
            .ok_or(StoreError::MissingAnalysis { id: run.id() })?;
        let path = self.layout.resolve(relative);
        let bytes = fs::read(&path).map_err(|source| StoreError::ReadBlob {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::ParseBlob { path, source })
    }

    /// Absolute path of the upload of `run`.
    pub fn upload_path(&self, run: &Run) -> PathBuf {
        self.layout.resolve(run.uploaded_file_relative_path())
    }

    /// Marks runs left `running` by a previous process as failed and lists
    /// the runs still queued.
    ///
    /// # Errors
    ///
    /// Returns index read or write errors.
    pub fn recover_interrupted(&self) -> Result<RecoveryReport, StoreError> {
        let report = self.mutate(|runs| {
            let mut report = RecoveryReport::default();
            for run in runs.iter_mut() {
                match run.status() {
                    RunStatus::Running => {
                        run.mark_failed(INTERRUPTED_MESSAGE)?;
                        report.interrupted.push(run.id());
                    }
                    RunStatus::Queued => report.requeued.push(run.id()),
                    RunStatus::Complete | RunStatus::Failed => {}
                }
            }
            Ok(report)
        })?;
        if !report.interrupted.is_empty() || !report.requeued.is_empty() {
            info!(
                target: STORE_TARGET,
                interrupted = report.interrupted.len(),
                requeued = report.requeued.len(),
                "recovered runs from previous process"
            );
        }
        Ok(report)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Vec<Run>>>, StoreError> {
        self.cache.lock().map_err(|_| StoreError::Poisoned)
    }

    fn loaded<'a>(&self, slot: &'a mut Option<Vec<Run>>) -> Result<&'a mut Vec<Run>, StoreError> {
        if slot.is_none() {
            *slot = Some(read_index(&self.layout.index_path())?);
        }
        Ok(slot.get_or_insert_with(Vec::new))
    }

    /// Applies `change` to a copy of the index, writes it, then swaps it
    /// into the cache. The cache is untouched when either step fails.
    fn mutate<T, F>(&self, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<Run>) -> Result<T, StoreError>,
    {
        let mut guard = self.lock()?;
        let mut runs = self.loaded(&mut guard)?.clone();
        let outcome = change(&mut runs)?;
        write_index(&self.layout.index_path(), &runs)?;
        *guard = Some(runs);
        Ok(outcome)
    }
}

fn remove_blob(id: RunId, blob: &Path) {
    match fs::remove_file(blob) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => warn!(
            target: STORE_TARGET,
            run = %id,
            path = %blob.display(),
            error = %error,
            "failed to remove run blob"
        ),
    }
}
