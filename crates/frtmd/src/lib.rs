//! Embedded HTTP job server for FRTMTools package analysis.
//!
//! `frtmd` accepts IPA and APK uploads over a minimal HTTP/1.1 transport,
//! records each upload as a run in a durable index under the content root,
//! and analyses packages on background threads. Clients poll the JSON API or
//! the HTML pages until a run is complete and then read the rendered report.
//!
//! The daemon is assembled in layers:
//!
//! - [`transport`](crate::transport): listener, request parsing, body
//!   spooling, and response serialisation. One thread per connection; every
//!   connection carries one request.
//! - `dispatch`: routing from method and path to orchestrator calls, and the
//!   mapping from failures to HTTP statuses.
//! - [`JobOrchestrator`]: creates runs, spawns analyses, assembles pages.
//!   It is the only caller of the [`Analyzer`] and [`Renderer`] seams.
//! - [`RunStore`]: the run index and its blobs, with all mutations
//!   serialised behind one lock and written atomically.
//!
//! [`bootstrap_with`] wires these together from a [`ConfigLoader`], and
//! [`run_daemon`] serves until SIGTERM, SIGINT, SIGQUIT, or SIGHUP.
//!
//! On startup, runs a previous process left `running` are marked failed
//! with the message `interrupted`; runs still `queued` are analysed again.

mod bootstrap;
mod collaborators;
mod dispatch;
mod health;
mod jobs;
mod panic_message;
mod process;
mod store;
pub mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use collaborators::{
    Analysis, Analyzer, AnalyzerError, Collaborators, DigestAnalyzer, PlainHtmlRenderer,
    RenderError, Renderer,
};
pub use dispatch::DispatchError;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use jobs::{JobError, JobOrchestrator, PendingUpload, UPLOAD_CONTENT_TYPE};
pub use process::{
    LaunchError, RunningServer, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon,
};
pub use store::{INTERRUPTED_MESSAGE, RecoveryReport, RunStore, StoreError, StoreLayout};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
