//! Decoder implementation for HTTP message payloads.
//!
//! This module provides a unified decoder for handling different types of HTTP message bodies:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Payloads running until the peer closes the stream
//! - Messages with no body
//!
//! The kind of decoder is chosen by the framing rules in [`framing`](super::framing).

use std::fmt;

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::codec::body::remainder_decoder::RemainderDecoder;
use crate::protocol::{ParseError, PayloadItem, PayloadSize};
use crate::Config;
use bytes::BytesMut;
use http::HeaderMap;
use tokio_util::codec::Decoder;

/// A unified decoder for handling HTTP message payloads.
#[derive(Clone)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

/// Enum representing different payload decoding strategies.
#[derive(Debug, Clone)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Decode everything until end of stream
    Remainder(RemainderDecoder),

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    /// Creates the decoder matching the given framing.
    pub fn new(payload_size: PayloadSize, config: &Config) -> Self {
        match payload_size {
            PayloadSize::Length(0) | PayloadSize::Empty => Self::empty(),
            PayloadSize::Length(length) => Self::fix_length(length),
            PayloadSize::Chunked => Self { kind: Kind::Chunked(ChunkedDecoder::new(config.get_max_line_length(), config.get_max_headers())) },
            PayloadSize::Remainder => Self::remainder(config.get_block_size()),
        }
    }

    /// Creates a PayloadDecoder for messages with no body.
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    /// Creates a PayloadDecoder for chunked transfer encoding with default limits.
    pub fn chunked() -> Self {
        Self::new(PayloadSize::Chunked, &Config::default())
    }

    /// Creates a PayloadDecoder for a fixed-length payload.
    ///
    /// # Arguments
    /// * `size` - The expected content length in bytes
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Creates a PayloadDecoder that reads until the end of the stream.
    pub fn remainder(block_size: usize) -> Self {
        Self { kind: Kind::Remainder(RemainderDecoder::new(block_size)) }
    }

    /// Returns whether this decoder handles chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Returns whether this decoder handles messages with no body.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }

    /// Returns whether this decoder handles fixed-length payloads.
    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    /// Returns whether this decoder reads until the end of the stream.
    pub fn is_remainder(&self) -> bool {
        matches!(self.kind, Kind::Remainder(_))
    }

    /// Bytes still expected, only known for fixed-length payloads
    pub fn remaining(&self) -> Option<u64> {
        match &self.kind {
            Kind::Length(decoder) => Some(decoder.remaining()),
            _ => None,
        }
    }

    /// Trailer fields of a finished chunked payload
    pub fn trailers(&self) -> Option<&HeaderMap> {
        match &self.kind {
            Kind::Chunked(decoder) => decoder.trailers(),
            _ => None,
        }
    }

    pub fn take_trailers(&mut self) -> Option<HeaderMap> {
        match &mut self.kind {
            Kind::Chunked(decoder) => decoder.take_trailers(),
            _ => None,
        }
    }
}

impl fmt::Debug for PayloadDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Length(decoder) => write!(f, "fixed length, {} bytes remaining", decoder.remaining()),
            Kind::Chunked(_) => f.write_str("chunked"),
            Kind::Remainder(_) => f.write_str("remainder"),
            Kind::NoBody => f.write_str("empty"),
        }
    }
}

/// Implementation of the Decoder trait for HTTP payloads.
///
/// Delegates to the appropriate decoder based on the payload type.
impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::Remainder(remainder_decoder) => remainder_decoder.decode(src),
            Kind::NoBody => Ok(Some(PayloadItem::Eof)),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode_eof(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode_eof(src),
            Kind::Remainder(remainder_decoder) => remainder_decoder.decode_eof(src),
            Kind::NoBody => Ok(Some(PayloadItem::Eof)),
        }
    }
}
