//! Reading and writing the run index document.

use std::fs;
use std::io;
use std::path::Path;

use frtm_runs::Run;

use super::StoreError;
use super::files::atomic_write;

/// Loads the index. An absent or blank file is an empty index.
pub(super) fn read_index(path: &Path) -> Result<Vec<Run>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::ReadIndex {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|source| StoreError::ParseIndex {
        path: path.to_path_buf(),
        source,
    })
}

/// Replaces the index with `runs` atomically.
pub(super) fn write_index(path: &Path, runs: &[Run]) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(runs).map_err(|source| StoreError::Serialise {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, &bytes).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
