//! Minimal HTTP/1.1 transport for the job server.
//!
//! The listener accepts TCP connections on a background thread and hands
//! each one to a [`ConnectionHandler`] on its own thread. The remaining
//! modules implement the subset of HTTP the server speaks: a bounded request
//! head parser, a body reader that either buffers or spools to disk, and a
//! response serializer that always closes the connection.

mod body;
mod connection;
mod errors;
mod listener;
mod request;
mod response;
#[cfg(test)]
mod test_utils;

pub use self::body::{Body, BodyPolicy, StagedFile};
pub(crate) use self::body::{MAX_BUFFERED_BODY_BYTES, read_body};
pub(crate) use self::connection::ConnectionHandler;
pub use self::errors::{ListenerError, TransportError};
pub(crate) use self::listener::{HttpListener, ListenerHandle};
pub use self::request::{Headers, Method, Request};
pub(crate) use self::request::{ReceivedHead, read_head};
pub use self::response::{Response, StatusCode};
#[cfg(test)]
pub(crate) use self::test_utils::{ChunkedReader, CountingHandler};

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
