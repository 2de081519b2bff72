//! HTTP request handling.
//!
//! A request read from a connection is a [`RequestHead`] plus an optional
//! streaming [`Body`]. The `host` field is lifted out of the headers into
//! [`RequestHead::authority`], the framing fields are consumed by the body.

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, Method, Version};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::body::Body;
use crate::protocol::HttpError;

/// The parsed head of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// Value of the `host` field, if one was sent
    pub authority: Option<String>,
    pub method: Method,
    /// The request target exactly as sent, e.g. `/index.html?a=1` or `example.com:443`
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
}

/// A request read from a connection, borrowing it until dropped.
pub struct Request<'conn, T> {
    head: RequestHead,
    body: Option<Body<'conn, T>>,
}

impl<'conn, T> Request<'conn, T> {
    pub(crate) fn new(head: RequestHead, body: Option<Body<'conn, T>>) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn authority(&self) -> Option<&str> {
        self.head.authority.as_deref()
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn target(&self) -> &str {
        &self.head.target
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    /// Request headers, plus the trailers once a chunked body has been read.
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.head.headers
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

    pub fn into_parts(self) -> (RequestHead, Option<Body<'conn, T>>) {
        (self.head, self.body)
    }
}

impl<T> Request<'_, T>
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

impl<T> fmt::Debug for Request<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request").field("head", &self.head).field("body", &self.body).finish()
    }
}
