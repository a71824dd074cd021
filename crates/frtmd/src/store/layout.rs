//! On-disk layout of the content root.

use std::fs;
use std::path::{Path, PathBuf};

use frtm_runs::RunId;

use super::StoreError;

const INDEX_FILE: &str = "runs.json";
const UPLOADS_DIR: &str = "uploads";
const ANALYSES_DIR: &str = "analyses";

/// Paths under the content root:
/// `runs.json`, `uploads/<id>.<ext>`, and `analyses/<id>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the root and blob directories when missing.
    pub(crate) fn prepare(&self) -> Result<(), StoreError> {
        for directory in [self.root.clone(), self.uploads_dir(), self.analyses_dir()] {
            fs::create_dir_all(&directory).map_err(|source| StoreError::CreateDirectory {
                path: directory.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn analyses_dir(&self) -> PathBuf {
        self.root.join(ANALYSES_DIR)
    }

    pub fn upload_relative_path(id: RunId, extension: &str) -> String {
        format!("{UPLOADS_DIR}/{id}.{extension}")
    }

    pub fn analysis_relative_path(id: RunId) -> String {
        format!("{ANALYSES_DIR}/{id}.json")
    }

    /// Absolute path of a path stored in a run record.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}
