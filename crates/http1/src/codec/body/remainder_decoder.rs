//! Decoder for payloads delimited by the end of the stream.
//!
//! Used for responses without framing, tunnels and unknown transfer codings.
//! The payload ends when the peer closes its side; that is a normal end, not an error.

use std::cmp;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainderDecoder {
    block_size: usize,
}

impl RemainderDecoder {
    pub fn new(block_size: usize) -> Self {
        Self { block_size: block_size.max(1) }
    }
}

impl Decoder for RemainderDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let len = cmp::min(self.block_size, src.len());
        let bytes = src.split_to(len).freeze();
        trace!(len = bytes.len(), "read remainder bytes");
        Ok(Some(PayloadItem::Chunk(bytes)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Ok(Some(PayloadItem::Eof)),
        }
    }
}
