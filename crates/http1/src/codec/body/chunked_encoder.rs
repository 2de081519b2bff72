use crate::codec::header::header_encoder::{write_headers, FastWrite};
use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use http::HeaderMap;
use std::io::Write;
use tracing::trace;

use tokio_util::codec::Encoder;

/// Writes a body with `transfer-encoding: chunked`.
///
/// Trailers collected with [`ChunkedEncoder::add_trailers`] are written after
/// the last chunk.
#[derive(Debug, Clone, Default)]
pub struct ChunkedEncoder {
    eof: bool,
    trailers: HeaderMap,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `trailers` to the ones already collected, keeping every value of a repeated name.
    pub fn add_trailers(&mut self, trailers: HeaderMap) {
        let mut name = None;
        for (next, value) in trailers {
            // the map yields a name only for the first of its values
            if next.is_some() {
                name = next;
            }
            if let Some(name) = &name {
                self.trailers.append(name.clone(), value);
            }
        }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                // a zero sized chunk would terminate the body
                if !bytes.has_remaining() {
                    return Ok(());
                }
                write!(FastWrite(dst), "{:X}\r\n", bytes.remaining())?;
                dst.reserve(bytes.remaining() + 2);
                dst.put(bytes);
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Eof => {
                dst.extend_from_slice(b"0\r\n");
                write_headers(&self.trailers, dst)?;
                dst.extend_from_slice(b"\r\n");
                trace!(trailer_count = self.trailers.len(), "finished chunked body");
                self.eof = true;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::HeaderValue;

    use super::*;

    #[test]
    fn chunks_and_terminator() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello World")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::new()), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from(vec![b'x'; 26])), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        let expected = format!("B\r\nHello World\r\n1A\r\n{}\r\n0\r\n\r\n", "x".repeat(26));
        assert_eq!(&dst[..], expected.as_bytes());
        assert!(encoder.is_finish());

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"late")), &mut dst).unwrap();
        assert_eq!(&dst[..], expected.as_bytes());
    }

    #[test]
    fn trailers_after_last_chunk() {
        let mut encoder = ChunkedEncoder::new();
        let mut trailers = HeaderMap::new();
        trailers.insert("etag", HeaderValue::from_static("abcd"));
        encoder.add_trailers(trailers);

        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"abc")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"3\r\nabc\r\n0\r\netag: abcd\r\n\r\n");
    }

    #[test]
    fn trailers_added_twice_keep_both_values() {
        let mut encoder = ChunkedEncoder::new();
        let mut first = HeaderMap::new();
        first.insert("server-timing", HeaderValue::from_static("db;dur=53"));
        encoder.add_trailers(first);

        let mut second = HeaderMap::new();
        second.append("server-timing", HeaderValue::from_static("app;dur=47"));
        second.append("server-timing", HeaderValue::from_static("cache;dur=1"));
        encoder.add_trailers(second);

        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(
            &dst[..],
            &b"0\r\nserver-timing: db;dur=53\r\nserver-timing: app;dur=47\r\nserver-timing: cache;dur=1\r\n\r\n"[..]
        );
    }
}
