//! Connection handler that serves one HTTP request per connection.
//!
//! The handler reads the head, resolves the route, acquires the body with
//! the route's policy, dispatches inside a panic boundary, writes the
//! response, and closes the connection.

use std::io::{self, Read};
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{DISPATCH_TARGET, DispatchError, RequestRouter};
use crate::jobs::JobOrchestrator;
use crate::panic_message::panic_message;
use crate::transport::{
    ConnectionHandler, MAX_BUFFERED_BODY_BYTES, ReceivedHead, Request, Response, TransportError,
    read_body, read_head,
};

/// Longest wait for unread request bytes after an early response.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Drain budget when the request did not declare a usable length.
const UNKNOWN_LENGTH_DRAIN_BYTES: u64 = MAX_BUFFERED_BODY_BYTES as u64;

/// Serves HTTP requests against the job orchestrator.
#[derive(Debug, Clone)]
pub(crate) struct HttpConnectionHandler {
    router: RequestRouter,
}

impl HttpConnectionHandler {
    pub(crate) fn new(jobs: Arc<JobOrchestrator>) -> Self {
        Self {
            router: RequestRouter::new(jobs),
        }
    }

    fn serve(&self, stream: &mut TcpStream) {
        let ReceivedHead { request, leftover } = match read_head(stream) {
            Ok(Some(head)) => head,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return;
            }
            Err(error) => {
                reject_unreadable(stream, error);
                return;
            }
        };

        let content_length = match check_framing(&request) {
            Ok(length) => length,
            Err(error) => {
                respond(stream, &request, &error.into());
                drain(stream, UNKNOWN_LENGTH_DRAIN_BYTES);
                return;
            }
        };
        let unread = content_length.saturating_sub(leftover.len() as u64);

        let prepared = match self.router.prepare(&request) {
            Ok(prepared) => prepared,
            Err(error) => {
                respond(stream, &request, &error);
                drain(stream, unread);
                return;
            }
        };

        let body = match read_body(stream, leftover, content_length, prepared.policy()) {
            Ok(body) => body,
            Err(error) => {
                reject_body(stream, &request, error, unread);
                return;
            }
        };

        let router = &self.router;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            router.dispatch(prepared, &request, body)
        }));
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => error_response(&request, &error),
            Err(payload) => {
                let error = DispatchError::Panicked {
                    message: panic_message(payload.as_ref()),
                };
                warn!(
                    target: DISPATCH_TARGET,
                    method = %request.method(),
                    path = request.path(),
                    error = %error,
                    "request handler panicked"
                );
                error.to_response()
            }
        };
        write_response(stream, &request, &response);
    }
}

impl ConnectionHandler for HttpConnectionHandler {
    fn handle(&self, mut stream: TcpStream) {
        self.serve(&mut stream);
        let _ = stream.shutdown(Shutdown::Both);
    }
}

/// Validates body framing and returns the declared length.
fn check_framing(request: &Request) -> Result<u64, TransportError> {
    if let Some(encoding) = request.headers().get("transfer-encoding") {
        if !encoding.trim().eq_ignore_ascii_case("identity") {
            return Err(TransportError::UnsupportedTransferEncoding {
                value: encoding.to_owned(),
            });
        }
    }
    request.headers().content_length()
}

fn reject_unreadable(stream: &mut TcpStream, error: TransportError) {
    if error.response_status().is_none() {
        warn!(target: DISPATCH_TARGET, error = %error, "aborting connection");
        return;
    }
    warn!(target: DISPATCH_TARGET, error = %error, "malformed request");
    if let Err(write_error) = DispatchError::from(error).to_response().write_to(stream) {
        debug!(
            target: DISPATCH_TARGET,
            error = %write_error,
            "failed to write error response"
        );
        return;
    }
    drain(stream, UNKNOWN_LENGTH_DRAIN_BYTES);
}

fn reject_body(stream: &mut TcpStream, request: &Request, error: TransportError, unread: u64) {
    if error.response_status().is_none() {
        warn!(
            target: DISPATCH_TARGET,
            method = %request.method(),
            path = request.path(),
            error = %error,
            "aborting connection while reading body"
        );
        return;
    }
    respond(stream, request, &error.into());
    drain(stream, unread);
}

fn error_response(request: &Request, error: &DispatchError) -> Response {
    let response = error.to_response();
    if response.status().code() >= 500 {
        warn!(
            target: DISPATCH_TARGET,
            method = %request.method(),
            path = request.path(),
            error = %error,
            "request failed"
        );
    } else {
        debug!(
            target: DISPATCH_TARGET,
            method = %request.method(),
            path = request.path(),
            error = %error,
            "request rejected"
        );
    }
    response
}

fn respond(stream: &mut TcpStream, request: &Request, error: &DispatchError) {
    let response = error_response(request, error);
    write_response(stream, request, &response);
}

fn write_response(stream: &mut TcpStream, request: &Request, response: &Response) {
    match response.write_to(stream) {
        Ok(()) => info!(
            target: DISPATCH_TARGET,
            method = %request.method(),
            path = request.path(),
            status = response.status().code(),
            "request served"
        ),
        Err(error) => warn!(
            target: DISPATCH_TARGET,
            method = %request.method(),
            path = request.path(),
            error = %error,
            "failed to write response"
        ),
    }
}

/// Discards request bytes the handler never read so closing the socket does
/// not reset the connection before the client reads the response.
fn drain(stream: &mut TcpStream, unread: u64) {
    if unread == 0 {
        return;
    }
    let _ = stream.shutdown(Shutdown::Write);
    if stream.set_read_timeout(Some(DRAIN_TIMEOUT)).is_err() {
        return;
    }
    let limit = unread.min(MAX_BUFFERED_BODY_BYTES as u64);
    let _ = io::copy(&mut Read::by_ref(stream).take(limit), &mut io::sink());
}
