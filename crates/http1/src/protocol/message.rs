use bytes::{Buf, Bytes};

/// One step of a body stream: some payload bytes, or the end of the payload.
///
/// Body decoders produce `PayloadItem<Bytes>`. Body encoders accept any
/// [`Buf`], so frames of an `http_body::Body` are written without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<D: Buf = Bytes> {
    Chunk(D),
    Eof,
}

impl<D: Buf> PayloadItem<D> {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    /// The chunk, `None` for [`PayloadItem::Eof`]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        if let PayloadItem::Chunk(bytes) = self { Some(bytes) } else { None }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        if let PayloadItem::Chunk(bytes) = self { Some(bytes) } else { None }
    }
}

/// How a message body is delimited on the wire.
///
/// Decided from the method, status and headers of a message by
/// [`framing`](crate::codec::body::framing), and used to pick the body
/// decoder or encoder.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// `content-length` bytes
    Length(u64),
    /// chunked transfer coding, possibly followed by trailers
    Chunked,
    /// everything until the peer closes the stream
    Remainder,
    /// no body at all
    Empty,
}

impl PayloadSize {
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    #[inline]
    pub fn is_remainder(&self) -> bool {
        matches!(self, PayloadSize::Remainder)
    }

    /// True for `Empty` and for a zero `Length`
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty | PayloadSize::Length(0))
    }
}
