use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// Buffered transport shared by the read and write side of a connection.
///
/// Reads go through [`Decoder`]s the way a `FramedRead` drives them, but the
/// decoder changes from one call to the next (line, header block, body), so
/// the read buffer is kept here instead of inside a framed wrapper. Writes are
/// accumulated in a buffer and only reach the transport on [`flush`](Stream::flush).
#[derive(Debug)]
pub(crate) struct Stream<T> {
    io: T,
    read_buf: BytesMut,
    write_buf: BytesMut,
    block_size: usize,
    eof: bool,
    read_closed: bool,
}

impl<T> Stream<T> {
    pub(crate) fn new(io: T, block_size: usize) -> Self {
        Self {
            io,
            read_buf: BytesMut::with_capacity(block_size),
            write_buf: BytesMut::with_capacity(block_size),
            block_size,
            eof: false,
            read_closed: false,
        }
    }

    /// Buffer for outgoing bytes, sent on the next flush
    #[inline]
    pub(crate) fn write_buf(&mut self) -> &mut BytesMut {
        &mut self.write_buf
    }

    #[inline]
    pub(crate) fn encode<E, I>(&mut self, encoder: &mut E, item: I) -> Result<(), E::Error>
    where
        E: Encoder<I>,
    {
        encoder.encode(item, &mut self.write_buf)
    }

    /// Stops reading: every later decode sees end of stream.
    ///
    /// Bytes already read ahead are never decoded again, but stay in the
    /// buffer so a hijacked stream (a tunnel after `CONNECT`) can replay them.
    pub(crate) fn close_read(&mut self) {
        if !self.read_closed {
            trace!(buffered = self.read_buf.len(), "closing read side");
        }
        self.read_closed = true;
    }

    pub(crate) fn is_read_closed(&self) -> bool {
        self.read_closed
    }

    /// Returns the transport and whatever was read from it but not consumed yet.
    pub(crate) fn into_parts(self) -> (T, Bytes) {
        (self.io, self.read_buf.freeze())
    }
}

impl<T> Stream<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Decodes the next item, reading from the transport as needed.
    ///
    /// At end of stream the decoder's `decode_eof` decides if the buffered
    /// remainder is an item, a clean end (`None`) or an error.
    pub(crate) async fn decode<D>(&mut self, decoder: &mut D) -> Result<Option<D::Item>, D::Error>
    where
        D: Decoder,
    {
        loop {
            if self.read_closed {
                return decoder.decode_eof(&mut BytesMut::new());
            }

            if self.eof {
                return decoder.decode_eof(&mut self.read_buf);
            }

            // an empty buffer can still complete an item, e.g. the end of a fixed length body
            if let Some(item) = decoder.decode(&mut self.read_buf)? {
                return Ok(Some(item));
            }

            self.read_buf.reserve(self.block_size);
            let n = self.io.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                trace!("reached end of stream");
                self.eof = true;
            } else {
                trace!(len = n, "read from stream");
            }
        }
    }

    pub(crate) async fn flush(&mut self) -> io::Result<()> {
        if !self.write_buf.is_empty() {
            trace!(len = self.write_buf.len(), "write to stream");
            self.io.write_all(&self.write_buf).await?;
            self.write_buf.clear();
        }
        self.io.flush().await
    }

    /// Flushes pending output and shuts down the write side of the transport.
    pub(crate) async fn close_write(&mut self) -> io::Result<()> {
        self.flush().await?;
        self.io.shutdown().await
    }
}
