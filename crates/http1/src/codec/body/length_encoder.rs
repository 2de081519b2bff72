use crate::ensure;
use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::trace;

/// Writes a body whose length was announced with `content-length`.
///
/// Writing more than the announced length fails before the offending chunk
/// is copied. Finishing with fewer bytes fails at [`PayloadItem::Eof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    length: u64,
    written: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { length, written: 0 }
    }

    pub fn is_finish(&self) -> bool {
        self.written == self.length
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                if !bytes.has_remaining() {
                    return Ok(());
                }
                let actual = self.written + bytes.remaining() as u64;
                ensure!(actual <= self.length, SendError::content_length(self.length, actual));

                dst.put(bytes);
                self.written = actual;
                Ok(())
            }
            PayloadItem::Eof => {
                ensure!(self.is_finish(), SendError::content_length(self.length, self.written));
                trace!(len = self.written, "finished fixed length body");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn exact_length() {
        let mut encoder = LengthEncoder::new(11);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello ")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"World")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"Hello World");
    }

    #[test]
    fn too_many_bytes() {
        let mut encoder = LengthEncoder::new(3);
        let mut dst = BytesMut::new();

        let result = encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello")), &mut dst);
        assert!(matches!(result, Err(SendError::ContentLength { expected: 3, actual: 5 })));
        assert!(dst.is_empty());
    }

    #[test]
    fn too_few_bytes() {
        let mut encoder = LengthEncoder::new(10);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello")), &mut dst).unwrap();
        let result = encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst);
        assert!(matches!(result, Err(SendError::ContentLength { expected: 10, actual: 5 })));
    }
}
