//! HTTP response handling.
//!
//! Mirrors the request types for the client side: a [`ResponseHead`]
//! plus an optional streaming [`Body`].

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::body::Body;
use crate::protocol::HttpError;

/// The parsed head of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub version: Version,
    pub status: StatusCode,
    /// Reason phrase as sent, possibly empty
    pub reason: String,
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// 1xx responses other than `101 Switching Protocols` precede the final response.
    pub fn is_interim(&self) -> bool {
        self.status.is_informational() && self.status != StatusCode::SWITCHING_PROTOCOLS
    }
}

/// A response read from a connection, borrowing it until dropped.
pub struct Response<'conn, T> {
    head: ResponseHead,
    body: Option<Body<'conn, T>>,
}

impl<'conn, T> Response<'conn, T> {
    pub(crate) fn new(head: ResponseHead, body: Option<Body<'conn, T>>) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    pub fn reason(&self) -> &str {
        &self.head.reason
    }

    /// Response headers, plus the trailers once a chunked body has been read.
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn is_interim(&self) -> bool {
        self.head.is_interim()
    }

    pub fn body(&self) -> Option<&Body<'conn, T>> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> Option<&mut Body<'conn, T>> {
        self.body.as_mut()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn into_parts(self) -> (ResponseHead, Option<Body<'conn, T>>) {
        (self.head, self.body)
    }
}

impl<T> Response<'_, T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the next body chunk. At the end of the body its trailers are merged into the headers.
    pub async fn read_chunk(&mut self) -> Result<Option<Bytes>, HttpError> {
        let Some(body) = self.body.as_mut() else {
            return Ok(None);
        };

        let chunk = body.read().await?;
        if chunk.is_none() {
            body.merge_trailers(&mut self.head.headers);
        }
        Ok(chunk)
    }

    /// Reads the whole body, merging its trailers into the headers.
    pub async fn join(&mut self) -> Result<Bytes, HttpError> {
        let Some(body) = self.body.as_mut() else {
            return Ok(Bytes::new());
        };

        let bytes = body.join().await?;
        body.merge_trailers(&mut self.head.headers);
        Ok(bytes)
    }
}

impl<T> fmt::Debug for Response<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response").field("head", &self.head).field("body", &self.body).finish()
    }
}
