//! Request head parsing.
//!
//! Only the request line and headers are parsed here; the body is acquired
//! separately once the router has decided how it should be stored.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read};

use percent_encoding::percent_decode_str;

use super::TransportError;

/// Upper bound on the request line plus headers.
pub(crate) const MAX_HEAD_BYTES: usize = 1024 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
const HEAD_CHUNK_BYTES: usize = 8 * 1024;

/// Request method. Only `GET` and `POST` are routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "POST" => Self::Post,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Header map with case-insensitive names (stored lowercased).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Inserts a header, joining repeated names with `", "`.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.0
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_owned());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Declared body length; zero when the header is absent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidContentLength`] for non-numeric values.
    pub fn content_length(&self) -> Result<u64, TransportError> {
        match self.get("content-length") {
            None => Ok(0),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| TransportError::InvalidContentLength {
                    value: value.to_owned(),
                }),
        }
    }

    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<String> {
        self.get("content-type").map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// Parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    headers: Headers,
}

impl Request {
    /// Parses the bytes before the blank line terminating the head.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the request line or a header line is
    /// malformed, or when the head is not UTF-8.
    pub fn parse_head(head: &[u8]) -> Result<Self, TransportError> {
        let text = std::str::from_utf8(head).map_err(|_| TransportError::NonUtf8Head)?;
        let mut lines = text.split("\r\n");
        let request_line = lines.next().unwrap_or_default();
        let (method, target) = parse_request_line(request_line)?;
        let (path, query) = split_target(target);

        let mut headers = Headers::default();
        for line in lines.filter(|line| !line.is_empty()) {
            let Some((name, value)) = line.split_once(':') else {
                return Err(TransportError::MalformedHeader {
                    line: line.to_owned(),
                });
            };
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(TransportError::MalformedHeader {
                    line: line.to_owned(),
                });
            }
            headers.insert(name, value.trim());
        }

        Ok(Self {
            method,
            path,
            query,
            headers,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path component of the request target, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query parameter; the first occurrence wins.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

fn parse_request_line(line: &str) -> Result<(Method, &str), TransportError> {
    let malformed = || TransportError::MalformedRequestLine {
        line: line.to_owned(),
    };
    let mut parts = line.split(' ').filter(|part| !part.is_empty());
    let (Some(method), Some(target), Some(_version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };
    if !method.bytes().all(|byte| byte.is_ascii_uppercase()) || !target.starts_with('/') {
        return Err(malformed());
    }
    Ok((Method::parse(method), target))
}

fn split_target(target: &str) -> (String, BTreeMap<String, String>) {
    let (path, raw_query) = target.split_once('?').unwrap_or((target, ""));
    let mut query = BTreeMap::new();
    for pair in raw_query.split('&').filter(|pair| !pair.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        query
            .entry(decode_component(name))
            .or_insert_with(|| decode_component(value));
    }
    (path.to_owned(), query)
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Head plus any body bytes that arrived in the same reads.
#[derive(Debug)]
pub(crate) struct ReceivedHead {
    pub(crate) request: Request,
    pub(crate) leftover: Vec<u8>,
}

/// Reads until the blank line ending the head.
///
/// Returns `Ok(None)` when the peer closes without sending anything.
pub(crate) fn read_head<R: Read>(reader: &mut R) -> Result<Option<ReceivedHead>, TransportError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; HEAD_CHUNK_BYTES];
    loop {
        let bytes_read = read_with_retry(reader, &mut chunk)?;
        if bytes_read == 0 {
            return if buffer.is_empty() {
                Ok(None)
            } else {
                Err(TransportError::IncompleteHead)
            };
        }

        // The terminator may straddle the previous read.
        let scan_from = buffer.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        buffer.extend_from_slice(&chunk[..bytes_read]);

        if let Some(offset) = find_terminator(&buffer[scan_from..]) {
            let head_end = scan_from + offset;
            if head_end > MAX_HEAD_BYTES {
                return Err(TransportError::HeadTooLarge {
                    max: MAX_HEAD_BYTES,
                });
            }
            let leftover = buffer.split_off(head_end + HEAD_TERMINATOR.len());
            buffer.truncate(head_end);
            let request = Request::parse_head(&buffer)?;
            return Ok(Some(ReceivedHead { request, leftover }));
        }

        if buffer.len() > MAX_HEAD_BYTES {
            return Err(TransportError::HeadTooLarge {
                max: MAX_HEAD_BYTES,
            });
        }
    }
}

fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

/// Reads from the stream, retrying on interrupts.
pub(crate) fn read_with_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}
