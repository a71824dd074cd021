//! Test harness utilities shared by the daemon suites.

mod config_loader;
mod http;
mod reporter;
mod server;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use http::{HttpReply, get, post, send_raw, upload};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use server::TestServer;
