//! Error types for the listener and HTTP message handling.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use super::StatusCode;

/// Errors surfaced while binding or running the TCP listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to read listener address: {source}")]
    LocalAddr {
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn listener thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    #[error("listener thread panicked")]
    ThreadPanic,
}

/// Errors raised while reading a request from a connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed before the request head was complete")]
    IncompleteHead,
    #[error("request head exceeds the {max} byte limit")]
    HeadTooLarge { max: usize },
    #[error("request head is not valid UTF-8")]
    NonUtf8Head,
    #[error("malformed request line: {line:?}")]
    MalformedRequestLine { line: String },
    #[error("malformed header line: {line:?}")]
    MalformedHeader { line: String },
    #[error("invalid Content-Length: {value:?}")]
    InvalidContentLength { value: String },
    #[error("unsupported transfer encoding: {value}")]
    UnsupportedTransferEncoding { value: String },
    #[error("request body of {size} bytes exceeds the {max} byte limit")]
    BodyTooLarge { size: u64, max: usize },
    #[error("connection closed after {received} of {expected} body bytes")]
    TruncatedBody { received: u64, expected: u64 },
    #[error("failed to stage upload in {}: {source}", staging_dir.display())]
    Spool {
        staging_dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Status to answer with, or `None` when the connection should be dropped
    /// without a response.
    pub fn response_status(&self) -> Option<StatusCode> {
        match self {
            Self::MalformedRequestLine { .. }
            | Self::MalformedHeader { .. }
            | Self::NonUtf8Head
            | Self::InvalidContentLength { .. }
            | Self::UnsupportedTransferEncoding { .. } => Some(StatusCode::BadRequest),
            Self::BodyTooLarge { .. } => Some(StatusCode::PayloadTooLarge),
            Self::Spool { .. } => Some(StatusCode::InternalServerError),
            Self::Io(_)
            | Self::IncompleteHead
            | Self::HeadTooLarge { .. }
            | Self::TruncatedBody { .. } => None,
        }
    }

    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::IncompleteHead => "incomplete_head",
            Self::HeadTooLarge { .. } => "head_too_large",
            Self::NonUtf8Head => "non_utf8_head",
            Self::MalformedRequestLine { .. } => "malformed_request_line",
            Self::MalformedHeader { .. } => "malformed_header",
            Self::InvalidContentLength { .. } => "invalid_content_length",
            Self::UnsupportedTransferEncoding { .. } => "unsupported_transfer_encoding",
            Self::BodyTooLarge { .. } => "body_too_large",
            Self::TruncatedBody { .. } => "truncated_body",
            Self::Spool { .. } => "upload_staging_failed",
        }
    }
}
