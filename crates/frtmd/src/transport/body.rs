//! Request body acquisition.
//!
//! Upload routes spool their body straight to a temporary file so memory use
//! stays constant regardless of package size; every other route buffers.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use super::TransportError;
use super::request::read_with_retry;

/// Largest body buffered in memory for non-upload routes.
pub(crate) const MAX_BUFFERED_BODY_BYTES: usize = 16 * 1024 * 1024;

const BODY_CHUNK_BYTES: usize = 64 * 1024;
const STAGING_PREFIX: &str = ".upload-";

/// How a route wants its body delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Read the body into memory.
    Buffer,
    /// Spool the body into a temporary file inside `staging_dir`.
    Stream { staging_dir: PathBuf },
}

/// Received request body.
#[derive(Debug)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    File(StagedFile),
}

impl Body {
    /// Number of body bytes received.
    pub fn len(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Bytes(bytes) => bytes.len() as u64,
            Self::File(file) => file.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Body spooled to a temporary file. The file is removed when dropped unless
/// it has been persisted.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    len: u64,
}

impl StagedFile {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Moves the staged bytes to `destination` with a rename.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the rename fails; the staged file is removed.
    pub fn persist(self, destination: &Path) -> io::Result<()> {
        self.file
            .persist(destination)
            .map(drop)
            .map_err(|error| error.error)
    }
}

/// Reads exactly `content_length` body bytes.
///
/// `already_received` holds the bytes that arrived together with the head;
/// they count towards the body and are not read again.
pub(crate) fn read_body<R: Read>(
    reader: &mut R,
    mut already_received: Vec<u8>,
    content_length: u64,
    policy: &BodyPolicy,
) -> Result<Body, TransportError> {
    if content_length == 0 {
        return Ok(Body::Empty);
    }
    let prefix_len = usize::try_from(content_length).unwrap_or(usize::MAX);
    already_received.truncate(prefix_len);

    match policy {
        BodyPolicy::Buffer => buffer_body(reader, already_received, content_length),
        BodyPolicy::Stream { staging_dir } => {
            spool_body(reader, &already_received, content_length, staging_dir)
        }
    }
}

fn buffer_body<R: Read>(
    reader: &mut R,
    mut buffer: Vec<u8>,
    content_length: u64,
) -> Result<Body, TransportError> {
    let expected = match usize::try_from(content_length) {
        Ok(size) if size <= MAX_BUFFERED_BODY_BYTES => size,
        _ => {
            return Err(TransportError::BodyTooLarge {
                size: content_length,
                max: MAX_BUFFERED_BODY_BYTES,
            });
        }
    };
    buffer.reserve(expected.saturating_sub(buffer.len()));
    let mut chunk = vec![0_u8; BODY_CHUNK_BYTES];
    while buffer.len() < expected {
        let wanted = (expected - buffer.len()).min(chunk.len());
        let bytes_read = read_with_retry(reader, &mut chunk[..wanted])?;
        if bytes_read == 0 {
            return Err(TransportError::TruncatedBody {
                received: buffer.len() as u64,
                expected: content_length,
            });
        }
        buffer.extend_from_slice(&chunk[..bytes_read]);
    }
    Ok(Body::Bytes(buffer))
}

fn spool_body<R: Read>(
    reader: &mut R,
    prefix: &[u8],
    content_length: u64,
    staging_dir: &Path,
) -> Result<Body, TransportError> {
    let staging = |source: io::Error| TransportError::Spool {
        staging_dir: staging_dir.to_path_buf(),
        source,
    };
    let mut file = Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(staging_dir)
        .map_err(staging)?;
    file.write_all(prefix).map_err(staging)?;
    let mut received = prefix.len() as u64;

    let mut chunk = vec![0_u8; BODY_CHUNK_BYTES];
    while received < content_length {
        let remaining = content_length - received;
        let wanted = usize::try_from(remaining)
            .unwrap_or(usize::MAX)
            .min(chunk.len());
        // Socket errors stay `Io`; only local file errors are `Spool`.
        let bytes_read = read_with_retry(reader, &mut chunk[..wanted])?;
        if bytes_read == 0 {
            return Err(TransportError::TruncatedBody {
                received,
                expected: content_length,
            });
        }
        file.write_all(&chunk[..bytes_read]).map_err(staging)?;
        received += bytes_read as u64;
    }

    file.flush().map_err(staging)?;
    file.as_file().sync_all().map_err(staging)?;
    Ok(Body::File(StagedFile {
        file,
        len: received,
    }))
}
