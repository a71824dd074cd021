//! Shared configuration for the FRTMTools job server.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional TOML file (selected with `--config-path` or `FRTM_CONFIG_PATH`),
//! then `FRTM_*` environment variables, and finally command-line flags.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT, default_content_root, default_host_string,
    default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved settings for the job server daemon.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "FRTM")]
pub struct Config {
    /// Interface the HTTP listener binds to.
    #[ortho_config(default = defaults::default_host_string())]
    pub host: String,
    /// TCP port the HTTP listener binds to. Zero selects an ephemeral port.
    #[ortho_config(default = defaults::DEFAULT_PORT)]
    pub port: u16,
    /// Directory holding the run index, uploaded packages, and analyses.
    #[ortho_config(default = defaults::default_content_root())]
    pub content_root: Utf8PathBuf,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log events.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Whether runs interrupted by a previous shutdown are reconciled at startup.
    #[ortho_config(default = true)]
    pub recover_interrupted_runs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host_string(),
            port: DEFAULT_PORT,
            content_root: default_content_root(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            recover_interrupted_runs: true,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a layer fails to parse.
    pub fn load_from_env() -> Result<Self, Arc<OrthoError>> {
        Self::load()
    }

    /// Interface the listener binds to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port the listener binds to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Root directory of the run store.
    #[must_use]
    pub fn content_root(&self) -> &Utf8Path {
        &self.content_root
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Whether startup reconciliation of interrupted runs is enabled.
    #[must_use]
    pub fn recover_interrupted_runs(&self) -> bool {
        self.recover_interrupted_runs
    }

    /// Human-readable `host:port` pair used in logs.
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback() {
        let config = Config::default();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.listen_address(), format!("127.0.0.1:{DEFAULT_PORT}"));
    }

    #[test]
    fn default_content_root_is_namespaced() {
        let config = Config::default();
        assert_eq!(config.content_root().file_name(), Some("frtmtools"));
    }
}
