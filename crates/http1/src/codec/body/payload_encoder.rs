use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::{PayloadItem, PayloadSize, SendError};
use bytes::{Buf, BufMut, BytesMut};
use http::HeaderMap;

use tokio_util::codec::Encoder;

/// encode payload for a message body
#[derive(Debug, Clone)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    /// content-length payload
    Length(LengthEncoder),

    /// transfer-encoding chunked payload
    Chunked(ChunkedEncoder),

    /// payload delimited by closing the stream, written as is
    Raw,

    /// have no body with the message
    NoBody,
}

impl PayloadEncoder {
    /// create the encoder matching the framing announced in the head
    pub fn new(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => Self::fix_length(length),
            PayloadSize::Chunked => Self::chunked(),
            PayloadSize::Remainder => Self::raw(),
            PayloadSize::Empty => Self::empty(),
        }
    }

    /// create an empty `PayloadEncoder`
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    /// create a chunked `PayloadEncoder`
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    /// create a fixed length `PayloadEncoder`
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    /// create a `PayloadEncoder` that copies bytes without framing
    pub fn raw() -> Self {
        Self { kind: Kind::Raw }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }

    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.kind, Kind::Raw)
    }

    /// Trailers are only carried by chunked bodies, anything else drops them.
    ///
    /// Returns true if the trailers will be sent.
    pub fn add_trailers(&mut self, trailers: HeaderMap) -> bool {
        match &mut self.kind {
            Kind::Chunked(encoder) => {
                encoder.add_trailers(trailers);
                true
            }
            _ => false,
        }
    }

    pub fn is_finish(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finish(),
            Kind::Chunked(encoder) => encoder.is_finish(),
            Kind::Raw | Kind::NoBody => true,
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst),
            Kind::Chunked(encoder) => encoder.encode(item, dst),
            Kind::Raw => {
                if let PayloadItem::Chunk(bytes) = item {
                    dst.put(bytes);
                }
                Ok(())
            }
            Kind::NoBody => Ok(()),
        }
    }
}
