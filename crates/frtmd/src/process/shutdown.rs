//! Waiting for the operator to stop the server.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

const STOP_SIGNALS: [(i32, &str); 4] = [
    (SIGTERM, "SIGTERM"),
    (SIGINT, "SIGINT"),
    (SIGQUIT, "SIGQUIT"),
    (SIGHUP, "SIGHUP"),
];

/// Blocks the launch sequence until the server should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once shutdown was requested.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors raised while waiting for shutdown.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("failed to install signal handlers: {source}")]
    Install {
        #[source]
        source: io::Error,
    },
}

/// Stops on the first SIGTERM, SIGINT, SIGQUIT, or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new(STOP_SIGNALS.map(|(number, _)| number))
            .map_err(|source| ShutdownError::Install { source })?;
        let received = signals.forever().next();
        let name = STOP_SIGNALS
            .iter()
            .find(|(number, _)| Some(*number) == received)
            .map_or("unknown", |(_, name)| *name);
        info!(target: PROCESS_TARGET, signal = name, "stopping job server");
        Ok(())
    }
}
