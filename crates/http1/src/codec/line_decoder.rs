//! Decoder for CRLF terminated protocol lines.
//!
//! Start lines, header lines and chunk-size lines all share the same framing:
//! a sequence of bytes terminated by `\r\n`. A bare `\n` is not a terminator.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

const CRLF: &[u8] = b"\r\n";

/// Splits one line off the front of the buffer, without its terminator.
///
/// The decoder remembers how far it has already scanned, so feeding a long
/// line in small pieces stays linear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDecoder {
    max_length: usize,
    next_index: usize,
}

impl LineDecoder {
    pub fn new(max_length: usize) -> Self {
        Self { max_length, next_index: 0 }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Decoder for LineDecoder {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // a CR may already sit at the end of the previous scan
        let start = self.next_index.saturating_sub(1);
        let position = src[start..].windows(CRLF.len()).position(|window| window == CRLF).map(|offset| start + offset);

        match position {
            Some(length) => {
                self.next_index = 0;
                ensure!(length <= self.max_length, ParseError::line_too_long(self.max_length));

                let line = src.split_to(length).freeze();
                src.advance(CRLF.len());
                trace!(len = line.len(), "read line");
                Ok(Some(line))
            }
            None => {
                // the line can still end with CR at max_length and LF right after it
                ensure!(src.len() <= self.max_length + 1, ParseError::line_too_long(self.max_length));
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::unexpected_eof(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines() {
        let mut buffer = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);
        let mut decoder = LineDecoder::new(64);

        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap(), "GET / HTTP/1.1");
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap(), "Host: localhost");
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap(), "");
        assert!(buffer.is_empty());
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn waits_for_terminator_across_reads() {
        let mut buffer = BytesMut::from(&b"Accept: */*\r"[..]);
        let mut decoder = LineDecoder::new(64);

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        buffer.extend_from_slice(b"\nrest");

        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap(), "Accept: */*");
        assert_eq!(&buffer[..], b"rest");
    }

    #[test]
    fn bare_lf_is_not_a_terminator() {
        let mut buffer = BytesMut::from(&b"foo\nbar\r\n"[..]);
        let mut decoder = LineDecoder::new(64);

        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap(), "foo\nbar");
    }

    #[test]
    fn rejects_long_lines() {
        let mut decoder = LineDecoder::new(4);

        let mut buffer = BytesMut::from(&b"abcd\r\n"[..]);
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap(), "abcd");

        let mut buffer = BytesMut::from(&b"abcde\r\n"[..]);
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::LineTooLong { max_length: 4 })));

        let mut decoder = LineDecoder::new(4);
        let mut buffer = BytesMut::from(&b"abcdefgh"[..]);
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::LineTooLong { .. })));
    }

    #[test]
    fn eof_in_the_middle_of_a_line() {
        let mut decoder = LineDecoder::new(64);

        let mut buffer = BytesMut::new();
        assert!(decoder.decode_eof(&mut buffer).unwrap().is_none());

        let mut buffer = BytesMut::from(&b"GET / HT"[..]);
        assert!(matches!(decoder.decode_eof(&mut buffer), Err(ParseError::UnexpectedEof { remaining: None })));
    }
}
