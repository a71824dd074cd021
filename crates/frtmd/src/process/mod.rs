//! Process lifecycle: serving the HTTP listener until a shutdown signal.

mod errors;
mod launch;
mod server;
mod shutdown;

pub use self::errors::LaunchError;
pub use self::launch::run_daemon;
pub(crate) use self::launch::{LaunchPlan, run_daemon_with};
pub use self::server::RunningServer;
pub use self::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
