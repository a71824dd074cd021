//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use camino::Utf8PathBuf;
use frtm_config::Config;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use crate::bootstrap::ConfigLoader;

/// Loader that points the content root at a temporary directory and binds
/// an ephemeral loopback port.
pub struct TestConfigLoader {
    content_dir: Arc<TempDir>,
    port: u16,
    recover_interrupted_runs: bool,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary content root");
        Self {
            content_dir: Arc::new(dir),
            port: 0,
            recover_interrupted_runs: true,
        }
    }

    /// Reuses an existing content root, simulating a restart.
    #[must_use]
    pub fn sharing_root_with(other: &Self) -> Self {
        Self {
            content_dir: Arc::clone(&other.content_dir),
            port: other.port,
            recover_interrupted_runs: other.recover_interrupted_runs,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn without_recovery(mut self) -> Self {
        self.recover_interrupted_runs = false;
        self
    }

    pub fn content_root(&self) -> PathBuf {
        self.content_dir.path().join("content")
    }

    fn content_root_utf8(&self) -> Utf8PathBuf {
        utf8(&self.content_root())
    }
}

fn utf8(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("temporary path was not valid UTF-8")
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            host: String::from("127.0.0.1"),
            port: self.port,
            content_root: self.content_root_utf8(),
            recover_interrupted_runs: self.recover_interrupted_runs,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing an invalid port.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("frtmd"),
            OsString::from("--port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
