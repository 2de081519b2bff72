//! Raw access to a connection after it stopped speaking HTTP.
//!
//! After an upgrade (`101 Switching Protocols`) or a `CONNECT` tunnel the
//! stream is taken over with [`HttpConnection::hijack`](crate::connection::HttpConnection::hijack).
//! Whatever the connection had already read ahead is replayed before
//! reading from the transport again.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A transport with a prefix of already received bytes.
#[derive(Debug)]
pub struct RawStream<T> {
    pre: Option<Bytes>,
    inner: T,
}

impl<T> RawStream<T> {
    pub(crate) fn new(inner: T, buffered: Bytes) -> Self {
        let pre = if buffered.is_empty() { None } else { Some(buffered) };
        Self { pre, inner }
    }

    /// Bytes read ahead by the connection that haven't been consumed yet
    pub fn buffered(&self) -> &[u8] {
        self.pre.as_deref().unwrap_or_default()
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Returns the transport and the bytes that still have to be replayed.
    pub fn into_inner(self) -> (T, Bytes) {
        (self.inner, self.pre.unwrap_or_default())
    }
}

impl<T> AsyncRead for RawStream<T>
where
    T: AsyncRead + Unpin,
{
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if let Some(mut prefix) = self.pre.take() {
            if !prefix.is_empty() {
                let len = prefix.len().min(buf.remaining());
                buf.put_slice(&prefix[..len]);
                prefix.advance(len);
                if !prefix.is_empty() {
                    self.pre = Some(prefix);
                }
                return Poll::Ready(Ok(()));
            }
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<T> AsyncWrite for RawStream<T>
where
    T: AsyncWrite + Unpin,
{
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(mut self: Pin<&mut Self>, cx: &mut Context<'_>, bufs: &[io::IoSlice<'_>]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
