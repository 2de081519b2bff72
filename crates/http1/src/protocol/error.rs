use std::io;

use http::StatusCode;
use thiserror::Error;

use crate::connection::State;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("read error: {source}")]
    ReadError {
        #[from]
        source: ParseError,
    },

    #[error("write error: {source}")]
    WriteError {
        #[from]
        source: SendError,
    },

    #[error("cannot {operation} in state {state}")]
    ProtocolState { state: State, operation: &'static str },

    #[error("cannot {operation}, connection has been hijacked")]
    Hijacked { operation: &'static str },
}

impl HttpError {
    pub fn protocol_state(state: State, operation: &'static str) -> Self {
        Self::ProtocolState { state, operation }
    }

    /// Returns the parse error if this error happened on the read side
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            HttpError::ReadError { source } => Some(source),
            _ => None,
        }
    }

    /// Returns the send error if this error happened on the write side
    pub fn as_send_error(&self) -> Option<&SendError> {
        match self {
            HttpError::WriteError { source } => Some(source),
            _ => None,
        }
    }

    pub fn is_protocol_state(&self) -> bool {
        matches!(self, HttpError::ProtocolState { .. } | HttpError::Hijacked { .. })
    }

    pub fn is_invalid_request(&self) -> bool {
        matches!(self.as_parse_error(), Some(ParseError::InvalidRequest { .. }))
            || matches!(self.as_send_error(), Some(SendError::InvalidRequest { .. }))
    }

    pub fn is_invalid_method(&self) -> bool {
        matches!(self.as_parse_error(), Some(ParseError::InvalidMethod { .. }))
    }

    pub fn is_bad_header(&self) -> bool {
        matches!(self.as_parse_error(), Some(ParseError::BadHeader { .. }))
            || matches!(self.as_send_error(), Some(SendError::BadHeader { .. }))
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self.as_parse_error(), Some(ParseError::BadRequest { .. }))
    }

    pub fn is_bad_response(&self) -> bool {
        matches!(self.as_parse_error(), Some(ParseError::BadResponse { .. }))
    }

    pub fn is_line_too_long(&self) -> bool {
        matches!(self.as_parse_error(), Some(ParseError::LineTooLong { .. }))
    }

    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self.as_parse_error(), Some(ParseError::UnexpectedEof { .. }))
    }

    pub fn is_content_length(&self) -> bool {
        matches!(self.as_send_error(), Some(SendError::ContentLength { .. }))
    }

    pub fn is_io(&self) -> bool {
        matches!(self.as_parse_error(), Some(ParseError::Io { .. })) || matches!(self.as_send_error(), Some(SendError::Io { .. }))
    }
}

/// Errors raised while reading and decoding a message from the peer.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid request line: {reason}")]
    InvalidRequest { reason: String },

    #[error("invalid request method: {method:?}")]
    InvalidMethod { method: String },

    #[error("bad header: {reason}")]
    BadHeader { reason: String },

    #[error("bad request: {reason}")]
    BadRequest { reason: String },

    #[error("bad response: {reason}")]
    BadResponse { reason: String },

    #[error("line exceeds the limit of {max_length} bytes")]
    LineTooLong { max_length: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("stream closed unexpectedly{}", .remaining.map(|n| format!(", {n} bytes remaining")).unwrap_or_default())]
    UnexpectedEof { remaining: Option<u64> },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_request<S: ToString>(str: S) -> Self {
        Self::InvalidRequest { reason: str.to_string() }
    }

    pub fn invalid_method(method: &[u8]) -> Self {
        Self::InvalidMethod { method: String::from_utf8_lossy(method).into_owned() }
    }

    pub fn bad_header<S: ToString>(str: S) -> Self {
        Self::BadHeader { reason: str.to_string() }
    }

    pub fn bad_request<S: ToString>(str: S) -> Self {
        Self::BadRequest { reason: str.to_string() }
    }

    pub fn bad_response<S: ToString>(str: S) -> Self {
        Self::BadResponse { reason: str.to_string() }
    }

    pub fn line_too_long(max_length: usize) -> Self {
        Self::LineTooLong { max_length }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn unexpected_eof(remaining: Option<u64>) -> Self {
        Self::UnexpectedEof { remaining }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The transport went away underneath the reader.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ParseError::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Errors raised while encoding and writing a message to the peer.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("refusing to send bad header: {reason}")]
    BadHeader { reason: String },

    #[error("refusing to send invalid request line: {reason}")]
    InvalidRequest { reason: String },

    #[error("invalid status {status} for this operation")]
    InvalidStatus { status: StatusCode },

    #[error("trying to write {actual} bytes, but content length was {expected} bytes")]
    ContentLength { expected: u64, actual: u64 },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn bad_header<S: ToString>(str: S) -> Self {
        Self::BadHeader { reason: str.to_string() }
    }

    pub fn invalid_request<S: ToString>(str: S) -> Self {
        Self::InvalidRequest { reason: str.to_string() }
    }

    pub fn invalid_status(status: StatusCode) -> Self {
        Self::InvalidStatus { status }
    }

    pub fn content_length(expected: u64, actual: u64) -> Self {
        Self::ContentLength { expected, actual }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
