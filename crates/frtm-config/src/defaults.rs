use std::env;

use camino::Utf8PathBuf;

use dirs::data_local_dir;

/// Default interface for the HTTP listener. The server is a local tool.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port for the HTTP listener.
pub const DEFAULT_PORT: u16 = 8765;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

const CONTENT_DIRECTORY: &str = "frtmtools";

/// Owned default host used where allocation is required (e.g. serde).
pub fn default_host_string() -> String {
    DEFAULT_HOST.to_owned()
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format. Operators run the server from a terminal.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Computes the default content root for the run store.
///
/// Uses the platform's local data directory, falling back to the system
/// temporary directory when it is unavailable or not valid UTF-8.
pub fn default_content_root() -> Utf8PathBuf {
    let mut base = data_local_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(fallback_base_directory);
    base.push(CONTENT_DIRECTORY);
    base
}

fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
