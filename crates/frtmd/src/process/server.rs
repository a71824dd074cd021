use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::bootstrap::Daemon;
use crate::dispatch::HttpConnectionHandler;
use crate::transport::{ConnectionHandler, HttpListener, ListenerHandle};

use super::{LaunchError, PROCESS_TARGET};

/// HTTP server accepting connections on behalf of a bootstrapped daemon.
pub struct RunningServer {
    listener: ListenerHandle,
}

impl RunningServer {
    /// Binds the configured host and port and starts accepting.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Listener`] when the address cannot be resolved
    /// or bound, for example because the port is taken.
    pub fn start(daemon: &Daemon) -> Result<Self, LaunchError> {
        let config = daemon.config();
        let listener = HttpListener::bind(config.host(), config.port())?;
        let handler: Arc<dyn ConnectionHandler> =
            Arc::new(HttpConnectionHandler::new(Arc::clone(daemon.jobs())));
        let listener = listener.start(handler)?;
        info!(
            target: PROCESS_TARGET,
            address = %listener.local_addr(),
            "serving http"
        );
        Ok(Self { listener })
    }

    /// Address the server is bound to, with an ephemeral port resolved.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Stops accepting connections and waits for the accept loop to exit.
    ///
    /// Connections and analyses already in flight run to completion on their
    /// own threads.
    pub fn stop(self) -> Result<(), LaunchError> {
        self.listener.shutdown();
        self.listener.join()?;
        Ok(())
    }
}

impl std::fmt::Debug for RunningServer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RunningServer")
            .field("local_addr", &self.local_addr())
            .finish()
    }
}
