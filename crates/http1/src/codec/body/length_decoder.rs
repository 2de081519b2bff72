//! Body framed by `content-length`
//! ([RFC 9112 Section 6.2](https://www.rfc-editor.org/rfc/rfc9112#section-6.2)).

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

/// Yields whatever part of the remaining `length` bytes is buffered, then `Eof`.
///
/// A stream that ends early is an unexpected end of file, the error carries the
/// number of missing bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    remaining: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length }
    }

    /// Bytes still expected from the peer
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.remaining == 0 {
            return Ok(Some(PayloadItem::Eof));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // anything past `remaining` belongs to the next message
        let take = usize::try_from(self.remaining).map_or(src.len(), |remaining| remaining.min(src.len()));
        let chunk = src.split_to(take).freeze();
        self.remaining -= take as u64;

        trace!(len = take, remaining = self.remaining, "read fixed length bytes");
        Ok(Some(PayloadItem::Chunk(chunk)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decode(src)?.map_or_else(|| Err(ParseError::unexpected_eof(Some(self.remaining))), |item| Ok(Some(item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_next_message_in_buffer() {
        let mut buffer = BytesMut::from(&b"Hello WorldGET / HTTP/1.1\r\n"[..]);
        let mut length_decoder = LengthDecoder::new(11);

        let chunk = length_decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), "Hello World");
        assert_eq!(&buffer[..], b"GET / HTTP/1.1\r\n");
        assert!(length_decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn split_across_reads() {
        let mut length_decoder = LengthDecoder::new(5);

        let mut buffer = BytesMut::from(&b"ab"[..]);
        assert_eq!(length_decoder.decode(&mut buffer).unwrap().unwrap().into_bytes().unwrap(), "ab");
        assert_eq!(length_decoder.remaining(), 3);
        assert!(length_decoder.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"cde");
        assert_eq!(length_decoder.decode(&mut buffer).unwrap().unwrap().into_bytes().unwrap(), "cde");
        assert!(length_decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn eof_before_length() {
        let mut length_decoder = LengthDecoder::new(8);

        let mut buffer = BytesMut::from(&b"abc"[..]);
        assert!(length_decoder.decode_eof(&mut buffer).unwrap().unwrap().is_chunk());

        let result = length_decoder.decode_eof(&mut buffer);
        assert!(matches!(result, Err(ParseError::UnexpectedEof { remaining: Some(5) })));
    }
}
