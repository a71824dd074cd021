//! Connection handling abstraction for the listener.

use std::net::TcpStream;

/// Handles accepted connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking
    /// and own the stream until the response is written.
    fn handle(&self, stream: TcpStream);
}
