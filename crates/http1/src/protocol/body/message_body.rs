use std::fmt;

use bytes::{Bytes, BytesMut};
use http::HeaderMap;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use crate::codec::body::PayloadDecoder;
use crate::connection::HttpConnection;
use crate::protocol::{HttpError, PayloadItem};

/// A streaming message body.
///
/// Chunks are produced by [`read`](Body::read) until it returns `None`.
/// Trailers of a chunked body become available once the body is finished.
pub struct Body<'conn, T> {
    connection: &'conn mut HttpConnection<T>,
    decoder: PayloadDecoder,
    finished: bool,
    length: u64,
    chunks: usize,
}

impl<'conn, T> Body<'conn, T> {
    pub(crate) fn new(connection: &'conn mut HttpConnection<T>, decoder: PayloadDecoder) -> Self {
        Self { connection, decoder, finished: false, length: 0, chunks: 0 }
    }

    /// True once no more data will be produced
    pub fn is_empty(&self) -> bool {
        self.finished
    }

    pub fn is_chunked(&self) -> bool {
        self.decoder.is_chunked()
    }

    /// True if the body runs until the peer closes the stream
    pub fn is_remainder(&self) -> bool {
        self.decoder.is_remainder()
    }

    /// Bytes read so far
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Bytes still expected, known for bodies framed by `content-length`
    pub fn remaining(&self) -> Option<u64> {
        self.decoder.remaining()
    }

    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.decoder.trailers()
    }

    /// Appends the trailers, if any, to `headers`.
    pub(crate) fn merge_trailers(&mut self, headers: &mut HeaderMap) {
        if let Some(trailers) = self.decoder.take_trailers() {
            for (name, value) in &trailers {
                headers.append(name.clone(), value.clone());
            }
        }
    }

    /// Stops reading: the connection closes its read side and won't be reused.
    pub fn close(mut self) {
        self.abort();
    }

    pub fn close_with_error(mut self, error: &dyn std::error::Error) {
        warn!(cause = %error, "closing body after error");
        self.abort();
    }

    fn abort(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        debug!(read = self.length, remaining = ?self.decoder.remaining(), "closing unfinished body");
        if let Err(e) = self.connection.close_read() {
            warn!(cause = %e, "failed to close read side of connection");
        }
    }
}

impl<T> Body<'_, T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the next chunk, `None` once the body is finished.
    ///
    /// If decoding fails the position in the stream is lost, the connection
    /// becomes non-persistent. A body running until the end of the stream
    /// treats a reset or aborted transport as its end.
    pub async fn read(&mut self) -> Result<Option<Bytes>, HttpError> {
        if self.finished {
            return Ok(None);
        }

        let stream = self.connection.stream_mut("read body")?;
        let item = match stream.decode(&mut self.decoder).await {
            Ok(item) => item,
            // a body delimited by the end of the stream ends however the stream ends
            Err(e) if self.decoder.is_remainder() && e.is_disconnect() => {
                debug!(cause = %e, "stream closed while reading remainder body");
                None
            }
            Err(e) => {
                self.connection.set_persistent(false);
                return Err(e.into());
            }
        };

        match item {
            Some(PayloadItem::Chunk(bytes)) => {
                self.length += bytes.len() as u64;
                self.chunks += 1;
                Ok(Some(bytes))
            }
            Some(PayloadItem::Eof) | None => {
                trace!(len = self.length, chunks = self.chunks, "finished reading body");
                self.finished = true;
                self.connection.receive_end_stream()?;
                Ok(None)
            }
        }
    }

    /// Reads the rest of the body into one buffer.
    pub async fn join(&mut self) -> Result<Bytes, HttpError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.read().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Reads and drops the rest of the body, keeping the connection reusable.
    pub async fn discard(&mut self) -> Result<(), HttpError> {
        while self.read().await?.is_some() {}
        Ok(())
    }
}

impl<T> Drop for Body<'_, T> {
    fn drop(&mut self) {
        self.abort();
    }
}

impl<T> fmt::Debug for Body<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("kind", &self.decoder)
            .field("length", &self.length)
            .field("chunks", &self.chunks)
            .field("finished", &self.finished)
            .finish()
    }
}
