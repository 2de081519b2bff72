//! Chunked transfer coding
//! ([RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1)).
//!
//! Chunk extensions are skipped. Trailer fields after the last chunk are kept
//! by the decoder until the caller takes them.

use std::cmp;

use bytes::{Buf, BytesMut};
use http::HeaderMap;
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::HeaderDecoder;
use crate::codec::line_decoder::LineDecoder;
use crate::ensure;
use crate::protocol::{ParseError, PayloadItem};
use ChunkedState::*;

const CRLF: &[u8] = b"\r\n";

/// Decodes `chunk-size CRLF data CRLF ... 0 CRLF trailers CRLF`.
///
/// Each call yields at most the buffered part of the current chunk, so a
/// large chunk is handed out in pieces as it arrives.
#[derive(Debug, Clone)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    line_decoder: LineDecoder,
    trailer_decoder: HeaderDecoder,
    trailers: Option<HeaderMap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk-size line
    Size,
    /// Read chunk data, with the number of bytes left in the current chunk
    Data(u64),
    /// Read the CRLF after chunk data
    DataEnd,
    /// Read the trailer section after the last chunk
    Trailer,
    /// Final state after the trailer section
    End,
}

impl ChunkedDecoder {
    /// `max_line_length` bounds chunk-size and trailer lines, `max_headers` the trailer count.
    pub fn new(max_line_length: usize, max_headers: usize) -> Self {
        Self {
            state: Size,
            line_decoder: LineDecoder::new(max_line_length),
            trailer_decoder: HeaderDecoder::new(max_line_length, max_headers),
            trailers: None,
        }
    }

    /// Trailer fields, available once the whole body has been decoded
    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.trailers.as_ref()
    }

    pub fn take_trailers(&mut self) -> Option<HeaderMap> {
        self.trailers.take()
    }

    pub fn is_finished(&self) -> bool {
        self.state == End
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                Size => {
                    let Some(line) = self.line_decoder.decode(src)? else {
                        return Ok(None);
                    };
                    let size = parse_chunk_size(&line)?;
                    trace!(size, "read chunk size");
                    self.state = if size == 0 { Trailer } else { Data(size) };
                }

                Data(remaining) => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    let len = cmp::min(remaining, src.len() as u64);
                    let bytes = src.split_to(len as usize).freeze();
                    let remaining = remaining - len;
                    self.state = if remaining == 0 { DataEnd } else { Data(remaining) };

                    trace!(len = bytes.len(), "read chunked bytes");
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                DataEnd => {
                    if src.len() < CRLF.len() {
                        return Ok(None);
                    }
                    ensure!(&src[..CRLF.len()] == CRLF, ParseError::bad_request("missing CRLF after chunk data"));
                    src.advance(CRLF.len());
                    self.state = Size;
                }

                Trailer => {
                    let Some(trailers) = self.trailer_decoder.decode(src)? else {
                        return Ok(None);
                    };
                    if !trailers.is_empty() {
                        trace!(trailer_count = trailers.len(), "read chunked trailers");
                        self.trailers = Some(trailers);
                    }
                    self.state = End;
                }

                End => {
                    trace!("finished reading chunked data");
                    return Ok(Some(PayloadItem::Eof));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Err(ParseError::unexpected_eof(match self.state {
                Data(remaining) => Some(remaining),
                _ => None,
            })),
        }
    }
}

/// Parses `1*HEXDIG [ chunk-ext ]`.
///
/// Signs, `0x` prefixes and leading whitespace are rejected, extensions are ignored.
fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let invalid = || ParseError::bad_request(format!("invalid chunk size: {:?}", String::from_utf8_lossy(line)));

    ensure!(line.first().is_some_and(u8::is_ascii_hexdigit), invalid());

    let mut framed = Vec::with_capacity(line.len() + CRLF.len());
    framed.extend_from_slice(line);
    framed.extend_from_slice(CRLF);

    match httparse::parse_chunk_size(&framed) {
        Ok(Status::Complete((_, size))) => Ok(size),
        Ok(Status::Partial) | Err(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn decoder() -> ChunkedDecoder {
        ChunkedDecoder::new(8192, 64)
    }

    #[test]
    fn test_basic() {
        let mut buffer: BytesMut = BytesMut::from(&b"10\r\n1234567890abcdef\r\n0\r\n\r\n"[..]);
        let mut decoder = decoder();
        {
            let item = decoder.decode(&mut buffer).unwrap().unwrap();
            assert!(item.is_chunk());
            assert_eq!(item.as_bytes().unwrap().len(), 16);

            let str = std::str::from_utf8(&item.as_bytes().unwrap()[..]).unwrap();
            assert_eq!(str, "1234567890abcdef");
        }

        {
            let item = decoder.decode(&mut buffer).unwrap().unwrap();
            assert!(item.is_eof());
            assert!(decoder.is_finished());
            assert!(decoder.trailers().is_none());
        }
    }

    #[test]
    fn test_multiple_chunks() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n"[..]);
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"hello"));

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b", world"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_chunks_with_extensions() {
        let mut buffer: BytesMut = BytesMut::from(&b"5;chunk-ext=value\r\nhello\r\n0\r\n\r\n"[..]);
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"hello"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_chunks_with_trailers() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhello\r\n0\r\nETag: abcd\r\nX-Checksum: 42\r\n\r\n"[..]);
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"hello"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());

        let trailers = decoder.take_trailers().unwrap();
        assert_eq!(trailers.get(http::header::ETAG).unwrap(), "abcd");
        assert_eq!(trailers.get("x-checksum").unwrap(), "42");
    }

    #[test]
    fn test_bad_trailer() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhello\r\n0\r\n:ETag abcd\r\n\r\n"[..]);
        let mut decoder = decoder();

        decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::BadHeader { .. })));
    }

    #[test]
    fn test_incomplete_chunk() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhel"[..]);
        let mut decoder = decoder();

        // partial chunk data is handed out as soon as it arrives
        let chunk = decoder.decode(&mut buffer).unwrap();
        assert_eq!(chunk.unwrap().as_bytes().unwrap(), &Bytes::copy_from_slice(b"hel"));

        buffer.extend_from_slice(b"lo\r\n0\r\n\r\n");

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"lo"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_invalid_chunk_size() {
        for size_line in [&b"xyz\r\n"[..], b"0x10\r\n", b"+10\r\n", b"-1\r\n", b" 5\r\n", b"\r\n"] {
            let mut buffer = BytesMut::from(size_line);
            let result = decoder().decode(&mut buffer);
            assert!(matches!(result, Err(ParseError::BadRequest { .. })), "{:?}", String::from_utf8_lossy(size_line));
        }
    }

    #[test]
    fn test_chunk_size_overflow() {
        let mut buffer = BytesMut::from(&b"fffffffffffffffff\r\n"[..]);
        assert!(matches!(decoder().decode(&mut buffer), Err(ParseError::BadRequest { .. })));
    }

    #[test]
    fn test_missing_crlf() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhelloBad"[..]);
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"hello"));

        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::BadRequest { .. })));
    }

    #[test]
    fn test_eof_inside_chunk() {
        let mut buffer: BytesMut = BytesMut::from(&b"c\r\nHello World"[..]);
        let mut decoder = decoder();

        let chunk = decoder.decode_eof(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"Hello World"));

        let result = decoder.decode_eof(&mut buffer);
        assert!(matches!(result, Err(ParseError::UnexpectedEof { remaining: Some(1) })));
    }

    #[test]
    fn test_large_chunk() {
        let size = 1024 * 1024;
        let mut data = Vec::with_capacity(size + 16);
        data.extend(format!("{size:x}\r\n").into_bytes());
        data.extend(vec![b'A'; size]);
        data.extend(b"\r\n0\r\n\r\n");

        let mut buffer = BytesMut::from(&data[..]);
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap().len(), size);
        assert!(chunk.as_bytes().unwrap().iter().all(|&b| b == b'A'));

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }
}
