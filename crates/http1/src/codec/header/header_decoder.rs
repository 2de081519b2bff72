//! Decoder for a block of header fields.
//!
//! Reads `field-line CRLF` entries until the empty line that terminates the
//! block. The same decoder handles the header section of requests and
//! responses and the trailer section of chunked bodies.
//!
//! # Limits
//!
//! - Each line is bounded by the configured maximum line length
//! - The number of fields is bounded by the configured maximum header count

use std::mem;

use bytes::BytesMut;
use http::HeaderMap;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::grammar::parse_header_line;
use crate::codec::line_decoder::LineDecoder;
use crate::ensure;
use crate::protocol::ParseError;

/// Accumulates fields across calls until the terminating empty line is seen.
#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    line_decoder: LineDecoder,
    max_headers: usize,
    headers: HeaderMap,
}

impl HeaderDecoder {
    pub fn new(max_line_length: usize, max_headers: usize) -> Self {
        Self { line_decoder: LineDecoder::new(max_line_length), max_headers, headers: HeaderMap::new() }
    }
}

impl Decoder for HeaderDecoder {
    type Item = HeaderMap;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(line) = self.line_decoder.decode(src)? {
            if line.is_empty() {
                trace!(header_count = self.headers.len(), "finished reading header block");
                return Ok(Some(mem::take(&mut self.headers)));
            }

            ensure!(self.headers.len() < self.max_headers, ParseError::too_many_headers(self.max_headers));

            let (name, value) = parse_header_line(&line)?;
            self.headers.append(name, value);
        }

        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(headers) => Ok(Some(headers)),
            None => Err(ParseError::unexpected_eof(None)),
        }
    }
}
